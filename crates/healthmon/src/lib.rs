use async_trait::async_trait;

pub use error::ReadinessError;

/// Readiness evaluation against one blockchain node
///
/// Implementations own the per-node state (including the liveness tracker),
/// so `is_ready` takes `&mut self` and is driven by a single poller.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Runs one evaluation cycle, using `token` as bearer credential if set.
    async fn is_ready(&mut self, token: Option<&str>) -> Result<(), ReadinessError>;
}

pub mod auth;
pub mod check;
pub mod config;
pub mod error;
pub mod ethereum;
pub mod ethereum_beacon;
pub mod hex;
mod http;
pub mod liveness;
pub mod metrics;
pub mod poller;
pub mod server;
pub mod state;
pub mod types;
mod utils;

pub use auth::{JwtTokenIssuer, TokenIssuer};
pub use check::CheckConfig;
pub use config::{ChainKind, NodeConfig};
pub use ethereum::EthereumAdapter;
pub use ethereum_beacon::EthereumBeaconAdapter;
pub use liveness::LivenessTracker;
pub use poller::Poller;
pub use server::HealthmonServer;
pub use state::ReadinessState;
