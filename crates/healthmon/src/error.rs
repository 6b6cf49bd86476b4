use std::time::Duration;

/// Failure of a single hex decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("empty hex value")]
    Empty,
    #[error("invalid hex digit in '{0}'")]
    InvalidDigit(String),
    #[error("hex value '{0}' overflows u64")]
    Overflow(String),
}

/// Reasons a node is judged not ready during one evaluation cycle.
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    /// Network failure, timeout or a non-200 response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match any expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The node says it is syncing but gives no distance.
    #[error("node reports syncing without distance information")]
    AmbiguousSyncStatus,

    #[error("syncing, distance {distance} blocks (tolerance: {tolerance})")]
    SyncLag { distance: u64, tolerance: u64 },

    #[error("can not decode latest block: {0}")]
    BlockDecode(String),

    #[error("latest block is too old: {}s", .age.as_secs())]
    StaleBlock { age: Duration },

    #[error("no new block for {}s", .elapsed.as_secs())]
    StallDetected { elapsed: Duration },

    /// The bearer token could not be minted.
    #[error("can not issue auth token: {0}")]
    Token(String),
}

impl From<reqwest::Error> for ReadinessError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
