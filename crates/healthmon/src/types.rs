use crate::hex::parse_hex_uint;
use serde::Deserialize;
use std::time::{Duration, SystemTime};

/// In-progress sync report of an execution node, as returned by `eth_syncing`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInfo {
    #[serde(default)]
    pub current_block: String,
    #[serde(default)]
    pub highest_block: String,
}

impl SyncInfo {
    pub fn current_block(&self) -> u64 {
        parse_hex_uint(&self.current_block)
    }

    pub fn highest_block(&self) -> u64 {
        parse_hex_uint(&self.highest_block)
    }

    /// Blocks left to sync. Inconsistent reports count as not behind.
    pub fn distance(&self) -> u64 {
        self.highest_block().saturating_sub(self.current_block())
    }
}

/// Normalized sync state of any supported node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    NotSyncing,
    SyncingWithDistance(u64),
    /// Syncing, but the node did not say how far behind it is.
    SyncingUnknown,
}

/// Latest block (or beacon slot) seen by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub timestamp: SystemTime,
}

impl Block {
    /// Time elapsed since the block was produced. Future timestamps count as zero.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.timestamp).unwrap_or_default()
    }
}
