use crate::{ChainAdapter, auth::TokenIssuer, metrics::HealthmonMetrics, state::ReadinessState};
use std::{sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically evaluates one node and publishes the verdict.
///
/// The poller is the only writer of the shared [`ReadinessState`]. Each cycle
/// is independent: a failure is recorded and the next tick retries.
pub struct Poller {
    adapter: Box<dyn ChainAdapter>,
    issuer: Option<Box<dyn TokenIssuer>>,
    state: Arc<ReadinessState>,
    metrics: HealthmonMetrics,
    interval: Duration,
}

impl Poller {
    pub fn new(adapter: impl ChainAdapter + 'static, state: Arc<ReadinessState>) -> Self {
        Self {
            adapter: Box::new(adapter),
            issuer: None,
            state,
            metrics: HealthmonMetrics::default(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_issuer(mut self, issuer: impl TokenIssuer + 'static) -> Self {
        self.issuer = Some(Box::new(issuer));
        self
    }

    /// Sets the time between two cycles. A zero interval is rejected.
    pub fn with_interval(mut self, interval: Duration) -> eyre::Result<Self> {
        eyre::ensure!(!interval.is_zero(), "poll interval must be greater than zero");
        self.interval = interval;
        Ok(self)
    }

    pub fn with_metrics(mut self, metrics: HealthmonMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn state(&self) -> Arc<ReadinessState> {
        self.state.clone()
    }

    /// Runs a single evaluation cycle.
    pub async fn poll_once(&mut self) {
        let token = match self.issuer.as_ref().map(|issuer| issuer.issue()).transpose() {
            Ok(token) => token,
            Err(err) => {
                self.metrics.record_verdict(false);
                self.state.mark_unhealthy(&err).await;
                return;
            }
        };

        match self.adapter.is_ready(token.as_deref()).await {
            Ok(()) => {
                self.metrics.record_verdict(true);
                self.state.mark_healthy().await;
            }
            Err(err) => {
                self.metrics.record_verdict(false);
                self.state.mark_unhealthy(&err).await;
            }
        }
    }

    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.poll_once().await;
        }
    }
}
