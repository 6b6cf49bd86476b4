//! Bearer tokens for authenticated (engine API) endpoints.

use crate::error::ReadinessError;
use alloy_rpc_types_engine::{Claims, JwtSecret};
use std::{
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

/// Produces a fresh bearer token for each poll cycle.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self) -> Result<String, ReadinessError>;
}

/// Signs HS256 tokens with a shared hex secret, as the engine API expects.
pub struct JwtTokenIssuer {
    secret: JwtSecret,
}

impl JwtTokenIssuer {
    pub fn new(secret: JwtSecret) -> Self {
        Self { secret }
    }

    /// Reads a hex-encoded JWT secret file.
    pub fn from_file(path: &Path) -> eyre::Result<Self> {
        let secret = JwtSecret::from_file(path).map_err(|e| {
            eyre::eyre!("failed to load JWT secret from {}: {}", path.display(), e)
        })?;
        Ok(Self::new(secret))
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self) -> Result<String, ReadinessError> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ReadinessError::Token(e.to_string()))?
            .as_secs();

        self.secret
            .encode(&Claims { iat, exp: None })
            .map_err(|e| ReadinessError::Token(e.to_string()))
    }
}
