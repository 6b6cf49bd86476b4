//! Request plumbing shared by the chain adapters.

use crate::error::ReadinessError;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

/// Sends `request` with an optional bearer token and decodes a JSON body.
///
/// Anything but a 200 is a transport error; a body of the wrong shape is a
/// protocol error tagged with `what`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    token: Option<&str>,
    what: &str,
) -> Result<T, ReadinessError> {
    let request = match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    };

    let response = request.send().await?;
    if response.status() != StatusCode::OK {
        return Err(ReadinessError::Transport(format!(
            "incorrect response status code: {}",
            response.status().as_u16()
        )));
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ReadinessError::Protocol(format!("{what}: {e}")))
}
