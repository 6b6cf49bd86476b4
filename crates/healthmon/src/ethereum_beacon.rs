use crate::utils::{deserialize_opt_string_to_u64, deserialize_string_to_u64};
use crate::{
    ChainAdapter,
    check::{CheckConfig, ReadinessChecks},
    error::ReadinessError,
    http::fetch_json,
    metrics::HealthmonMetrics,
    types::{Block, SyncStatus},
};
use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::{Duration, UNIX_EPOCH};
use url::Url;

/// Ethereum Beacon (Consensus Layer) node implementation (uses Beacon API)
///
/// Slots play the role of block numbers. A slot's timestamp is derived from
/// the genesis time and the slot duration, both fetched once and cached.
pub struct EthereumBeaconAdapter {
    api_url: Url,
    client: reqwest::Client,
    timing: Option<SlotTiming>,
    checks: ReadinessChecks,
}

#[derive(Debug, Clone, Copy)]
struct SlotTiming {
    genesis_time: u64,
    seconds_per_slot: u64,
}

#[derive(Deserialize)]
struct SyncingData {
    #[serde(default, deserialize_with = "deserialize_opt_string_to_u64")]
    sync_distance: Option<u64>,
    is_syncing: bool,
}

impl From<SyncingData> for SyncStatus {
    fn from(data: SyncingData) -> Self {
        match (data.is_syncing, data.sync_distance) {
            (false, _) => SyncStatus::NotSyncing,
            (true, Some(distance)) => SyncStatus::SyncingWithDistance(distance),
            (true, None) => SyncStatus::SyncingUnknown,
        }
    }
}

#[derive(Deserialize)]
struct HeaderData {
    header: SignedHeader,
}

#[derive(Deserialize)]
struct SignedHeader {
    message: HeaderMessage,
}

#[derive(Deserialize)]
struct HeaderMessage {
    slot: String,
}

#[derive(Deserialize)]
struct GenesisData {
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    genesis_time: u64,
}

#[derive(Deserialize)]
struct SpecData {
    #[serde(rename = "SECONDS_PER_SLOT", deserialize_with = "deserialize_string_to_u64")]
    seconds_per_slot: u64,
}

#[derive(Deserialize)]
struct ApiResult<T> {
    data: T,
}

impl EthereumBeaconAdapter {
    pub fn new(
        api_url: Url,
        timeout: Duration,
        certificate: Option<reqwest::Certificate>,
        config: CheckConfig,
        metrics: HealthmonMetrics,
    ) -> eyre::Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(certificate) = certificate {
            builder = builder.add_root_certificate(certificate);
        }

        Ok(Self {
            api_url,
            client: builder.build()?,
            timing: None,
            checks: ReadinessChecks::new(config, metrics),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: Option<&str>,
    ) -> Result<T, ReadinessError> {
        let url = format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            endpoint
        );

        let result: ApiResult<T> = fetch_json(self.client.get(&url), token, endpoint).await?;
        Ok(result.data)
    }

    async fn sync_status(&self, token: Option<&str>) -> Result<SyncStatus, ReadinessError> {
        let syncing: SyncingData = self.get("eth/v1/node/syncing", token).await?;
        Ok(syncing.into())
    }

    async fn head_slot(&self, token: Option<&str>) -> Result<u64, ReadinessError> {
        let head: HeaderData = self.get("eth/v1/beacon/headers/head", token).await?;
        let slot = head.header.message.slot;
        slot.parse::<u64>()
            .map_err(|e| ReadinessError::BlockDecode(format!("head slot '{slot}': {e}")))
    }

    async fn slot_timing(&mut self, token: Option<&str>) -> Result<SlotTiming, ReadinessError> {
        if let Some(timing) = self.timing {
            return Ok(timing);
        }

        let genesis: GenesisData = self.get("eth/v1/beacon/genesis", token).await?;
        let spec: SpecData = self.get("eth/v1/config/spec", token).await?;
        let timing = SlotTiming {
            genesis_time: genesis.genesis_time,
            seconds_per_slot: spec.seconds_per_slot,
        };
        tracing::debug!(?timing, "fetched beacon slot timing");

        self.timing = Some(timing);
        Ok(timing)
    }

    async fn latest_block(&mut self, token: Option<&str>) -> Result<Block, ReadinessError> {
        let slot = self.head_slot(token).await?;
        let timing = self.slot_timing(token).await?;

        let timestamp = slot
            .checked_mul(timing.seconds_per_slot)
            .and_then(|offset| offset.checked_add(timing.genesis_time))
            .and_then(|secs| UNIX_EPOCH.checked_add(Duration::from_secs(secs)))
            .ok_or_else(|| {
                ReadinessError::BlockDecode(format!("slot {slot} timestamp overflows"))
            })?;

        Ok(Block {
            number: slot,
            timestamp,
        })
    }
}

#[async_trait]
impl ChainAdapter for EthereumBeaconAdapter {
    async fn is_ready(&mut self, token: Option<&str>) -> Result<(), ReadinessError> {
        let status = self.sync_status(token).await?;
        self.checks.check_sync(status)?;

        let block = self.latest_block(token).await?;
        self.checks.check_block(&block)
    }
}
