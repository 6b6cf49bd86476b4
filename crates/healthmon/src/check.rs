//! Readiness policy shared by every chain adapter.

use crate::{
    error::ReadinessError,
    liveness::{DEFAULT_STALL_THRESHOLD, LivenessTracker},
    metrics::HealthmonMetrics,
    types::{Block, SyncStatus},
};
use std::time::{Duration, SystemTime};

/// Maximum age of the latest block before the node is considered stale.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckConfig {
    /// Blocks a syncing node may lag behind and still be ready.
    pub sync_tolerance: u64,
    pub freshness_window: Duration,
    pub stall_threshold: Duration,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            sync_tolerance: 0,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            stall_threshold: DEFAULT_STALL_THRESHOLD,
        }
    }
}

/// Sync, freshness and liveness checks for one monitored node.
pub struct ReadinessChecks {
    config: CheckConfig,
    tracker: LivenessTracker,
    metrics: HealthmonMetrics,
}

impl ReadinessChecks {
    pub fn new(config: CheckConfig, metrics: HealthmonMetrics) -> Self {
        Self {
            config,
            tracker: LivenessTracker::new(config.stall_threshold),
            metrics,
        }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn check_sync(&self, status: SyncStatus) -> Result<(), ReadinessError> {
        self.metrics.record_sync(status);

        match status {
            SyncStatus::NotSyncing => Ok(()),
            SyncStatus::SyncingUnknown => Err(ReadinessError::AmbiguousSyncStatus),
            SyncStatus::SyncingWithDistance(distance) => {
                let tolerance = self.config.sync_tolerance;
                if distance > tolerance {
                    return Err(ReadinessError::SyncLag {
                        distance,
                        tolerance,
                    });
                }
                if distance > 0 {
                    tracing::info!(
                        "node is syncing but within tolerance ({} <= {}), checking block age",
                        distance,
                        tolerance
                    );
                }
                Ok(())
            }
        }
    }

    /// Feeds the block into the liveness tracker, then checks freshness and progress.
    pub fn check_block(&mut self, block: &Block) -> Result<(), ReadinessError> {
        let now = SystemTime::now();
        self.metrics.record_block(block, now);
        self.tracker.observe(block.number);

        let age = block.age(now);
        if age > self.config.freshness_window {
            return Err(ReadinessError::StaleBlock { age });
        }

        self.tracker
            .check_liveness()
            .map_err(|elapsed| ReadinessError::StallDetected { elapsed })
    }
}
