use crate::error::ReadinessError;
use serde::Serialize;
use tokio::sync::RwLock;

/// Snapshot of the readiness verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub healthy: bool,
    pub last_error: Option<String>,
}

/// Aggregate readiness verdict, written by the poller and read by HTTP handlers.
///
/// Starts unhealthy until the first cycle completes.
#[derive(Debug, Default)]
pub struct ReadinessState {
    verdict: RwLock<Verdict>,
}

impl ReadinessState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mark_healthy(&self) {
        let mut verdict = self.verdict.write().await;
        if !verdict.healthy {
            tracing::info!("node is ready");
        }
        *verdict = Verdict {
            healthy: true,
            last_error: None,
        };
    }

    pub async fn mark_unhealthy(&self, err: &ReadinessError) {
        let message = err.to_string();
        tracing::warn!(error = %message, "node is not ready");

        *self.verdict.write().await = Verdict {
            healthy: false,
            last_error: Some(message),
        };
    }

    pub async fn is_healthy(&self) -> bool {
        self.verdict.read().await.healthy
    }

    pub async fn snapshot(&self) -> Verdict {
        self.verdict.read().await.clone()
    }
}
