use crate::{
    ChainAdapter,
    check::{CheckConfig, ReadinessChecks},
    error::ReadinessError,
    hex::{parse_hex_timestamp_strict, parse_hex_uint_strict},
    http::fetch_json,
    metrics::HealthmonMetrics,
    types::{Block, SyncInfo, SyncStatus},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

/// Execution layer node implementation (Geth, Reth, ... and the avax C-chain endpoint)
pub struct EthereumAdapter {
    rpc_url: Url,
    client: reqwest::Client,
    checks: ReadinessChecks,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `eth_syncing` returns either a progress object or `false`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SyncingResult {
    Info(SyncInfo),
    Flag(bool),
}

impl From<SyncingResult> for SyncStatus {
    fn from(result: SyncingResult) -> Self {
        match result {
            SyncingResult::Info(info) => SyncStatus::SyncingWithDistance(info.distance()),
            SyncingResult::Flag(false) => SyncStatus::NotSyncing,
            SyncingResult::Flag(true) => SyncStatus::SyncingUnknown,
        }
    }
}

#[derive(Deserialize)]
struct RawBlock {
    number: String,
    timestamp: String,
}

impl TryFrom<RawBlock> for Block {
    type Error = ReadinessError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let number = parse_hex_uint_strict(&raw.number)
            .map_err(|e| ReadinessError::BlockDecode(format!("block number: {e}")))?;
        let timestamp = parse_hex_timestamp_strict(&raw.timestamp)
            .map_err(|e| ReadinessError::BlockDecode(format!("block timestamp: {e}")))?;
        Ok(Block { number, timestamp })
    }
}

impl EthereumAdapter {
    pub fn new(
        rpc_url: Url,
        timeout: Duration,
        config: CheckConfig,
        metrics: HealthmonMetrics,
    ) -> eyre::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            rpc_url,
            client,
            checks: ReadinessChecks::new(config, metrics),
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        token: Option<&str>,
    ) -> Result<T, ReadinessError> {
        let payload = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let request = self.client.post(self.rpc_url.clone()).json(&payload);
        let response: JsonRpcResponse<T> = fetch_json(request, token, method).await?;

        if let Some(err) = response.error {
            return Err(ReadinessError::Protocol(format!(
                "{method} failed with code {}: {}",
                err.code, err.message
            )));
        }

        response
            .result
            .ok_or_else(|| ReadinessError::Protocol(format!("{method} returned no result")))
    }

    async fn sync_status(&self, token: Option<&str>) -> Result<SyncStatus, ReadinessError> {
        let result: SyncingResult = self.request("eth_syncing", json!([]), token).await?;
        Ok(result.into())
    }

    async fn latest_block(&self, token: Option<&str>) -> Result<Block, ReadinessError> {
        let raw: RawBlock = self
            .request("eth_getBlockByNumber", json!(["latest", false]), token)
            .await?;
        raw.try_into()
    }
}

#[async_trait]
impl ChainAdapter for EthereumAdapter {
    async fn is_ready(&mut self, token: Option<&str>) -> Result<(), ReadinessError> {
        let status = self.sync_status(token).await?;
        self.checks.check_sync(status)?;

        let block = self.latest_block(token).await?;
        self.checks.check_block(&block)
    }
}
