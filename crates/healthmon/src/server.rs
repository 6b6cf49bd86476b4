use crate::{
    poller::Poller,
    state::{ReadinessState, Verdict},
};
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
struct AppState {
    state: Arc<ReadinessState>,
    prometheus_handle: Option<PrometheusHandle>,
}

pub struct HealthmonServer {
    poller: Poller,
    app: AppState,
}

impl HealthmonServer {
    pub fn new(poller: Poller) -> Self {
        let app = AppState {
            state: poller.state(),
            prometheus_handle: None,
        };

        Self { poller, app }
    }

    /// Appends the internal gauges to `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.app.prometheus_handle = Some(handle);
        self
    }

    pub fn router(&self) -> Router {
        build_router(self.app.clone())
    }

    pub async fn serve(self, addr: &str) -> eyre::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("healthmon listening on {}", addr);

        let router = self.router();

        // Spawn periodic readiness polling task
        tokio::spawn(self.poller.run());

        // Serve with graceful shutdown
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Routes exposing the verdict held by `state`.
pub fn router(state: Arc<ReadinessState>) -> Router {
    build_router(AppState {
        state,
        prometheus_handle: None,
    })
}

fn build_router(app: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status_handler))
        .with_state(app)
}

async fn ready_handler(State(app): State<AppState>) -> (StatusCode, &'static str) {
    if app.state.is_healthy().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler(State(app): State<AppState>) -> String {
    let ready = u8::from(app.state.is_healthy().await);
    let mut body = format!("# TYPE ready gauge\nready {ready}\n");

    if let Some(handle) = &app.prometheus_handle {
        body.push_str(&handle.render());
    }
    body
}

async fn status_handler(State(app): State<AppState>) -> Json<Verdict> {
    Json(app.state.snapshot().await)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{check::CheckConfig, ethereum::EthereumAdapter, metrics::HealthmonMetrics};
    use serde_json::{Value, json};
    use std::{
        net::SocketAddr,
        time::{Duration, SystemTime, UNIX_EPOCH},
    };
    use tokio::net::TcpListener;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method},
    };

    /// Serves `router` on an ephemeral port.
    async fn start_test_server(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    async fn fetch(addr: SocketAddr, route: &str) -> (u16, String) {
        let resp = reqwest::get(format!("http://{addr}{route}")).await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.text().await.unwrap())
    }

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
    }

    /// Node that is not syncing and whose head advances on every request.
    async fn mount_advancing_node(server: &MockServer) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_syncing"})))
            .respond_with(rpc_result(json!(false)))
            .mount(server)
            .await;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        for number in [0x10u64, 0x11, 0x12] {
            Mock::given(method("POST"))
                .and(body_partial_json(json!({"method": "eth_getBlockByNumber"})))
                .respond_with(rpc_result(json!({
                    "number": format!("{number:#x}"),
                    "timestamp": format!("{now:#x}"),
                })))
                .up_to_n_times(1)
                .mount(server)
                .await;
        }
    }

    fn poller_for(node: &MockServer) -> Poller {
        let adapter = EthereumAdapter::new(
            node.uri().parse().unwrap(),
            Duration::from_secs(2),
            CheckConfig::default(),
            HealthmonMetrics::default(),
        )
        .unwrap();
        Poller::new(adapter, Arc::new(ReadinessState::new()))
    }

    #[tokio::test]
    async fn test_not_ready_before_first_poll() {
        let addr = start_test_server(router(Arc::new(ReadinessState::new()))).await;

        assert_eq!(fetch(addr, "/ready").await, (503, "NOT READY".to_string()));
        assert_eq!(
            fetch(addr, "/metrics").await,
            (200, "# TYPE ready gauge\nready 0\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_happy_path_end_to_end() {
        let node = MockServer::start().await;
        mount_advancing_node(&node).await;

        let mut poller = poller_for(&node);
        let addr = start_test_server(router(poller.state())).await;

        for _ in 0..3 {
            poller.poll_once().await;
            assert!(poller.state().is_healthy().await);
        }

        assert_eq!(fetch(addr, "/ready").await, (200, "OK".to_string()));
        assert_eq!(
            fetch(addr, "/metrics").await,
            (200, "# TYPE ready gauge\nready 1\n".to_string())
        );

        let (status, body) = fetch(addr, "/status").await;
        assert_eq!(status, 200);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({"healthy": true, "last_error": null}));
    }

    #[tokio::test]
    async fn test_transport_failure_end_to_end() {
        let node = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&node)
            .await;

        let mut poller = poller_for(&node);
        let addr = start_test_server(router(poller.state())).await;

        poller.poll_once().await;

        assert_eq!(fetch(addr, "/ready").await, (503, "NOT READY".to_string()));
        let (_, metrics) = fetch(addr, "/metrics").await;
        assert!(metrics.contains("ready 0\n"));

        let (_, body) = fetch(addr, "/status").await;
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["healthy"], false);
        assert!(
            body["last_error"]
                .as_str()
                .unwrap()
                .starts_with("transport error")
        );
    }

    #[tokio::test]
    async fn test_server_router_shares_poller_state() {
        let node = MockServer::start().await;
        mount_advancing_node(&node).await;

        let mut poller = poller_for(&node);
        poller.poll_once().await;

        let server = HealthmonServer::new(poller);
        let addr = start_test_server(server.router()).await;
        assert_eq!(fetch(addr, "/ready").await, (200, "OK".to_string()));
    }
}
