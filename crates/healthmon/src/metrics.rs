use crate::types::{Block, SyncStatus};
use metrics_derive::Metrics;
use std::time::SystemTime;

#[derive(Metrics, Clone)]
#[metrics(scope = "healthmon")]
pub struct HealthmonMetrics {
    /// Whether the node is ready
    #[metric(describe = "Whether the node is ready (1 = ready, 0 = not ready)")]
    pub ready: metrics::Gauge,

    /// Failed evaluation cycles
    #[metric(describe = "Number of evaluation cycles that judged the node not ready")]
    pub failed_checks_total: metrics::Counter,

    /// Latest block number
    #[metric(describe = "Latest block number (slot for beacon nodes)")]
    pub block_number: metrics::Gauge,

    /// Sync distance
    #[metric(describe = "Blocks behind the network head, 0 when not syncing")]
    pub sync_distance: metrics::Gauge,

    /// Age of the latest block
    #[metric(describe = "Seconds since the latest block was produced")]
    pub block_age_seconds: metrics::Gauge,
}

impl HealthmonMetrics {
    pub fn record_sync(&self, status: SyncStatus) {
        let distance = match status {
            SyncStatus::SyncingWithDistance(distance) => distance,
            SyncStatus::NotSyncing | SyncStatus::SyncingUnknown => 0,
        };
        self.sync_distance.set(distance as f64);
    }

    pub fn record_block(&self, block: &Block, now: SystemTime) {
        self.block_number.set(block.number as f64);
        self.block_age_seconds.set(block.age(now).as_secs_f64());
    }

    pub fn record_verdict(&self, healthy: bool) {
        self.ready.set(if healthy { 1.0 } else { 0.0 });
        if !healthy {
            self.failed_checks_total.increment(1);
        }
    }
}
