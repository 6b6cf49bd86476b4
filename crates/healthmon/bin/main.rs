use clap::{Args, Parser};
use healthmon::{
    ChainKind, CheckConfig, EthereumAdapter, EthereumBeaconAdapter, HealthmonServer,
    JwtTokenIssuer, NodeConfig, Poller, ReadinessState, config::load_certificate,
    metrics::HealthmonMetrics,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "healthmon")]
#[command(about = "Readiness probe for blockchain nodes", long_about = None)]
struct Cli {
    /// Chain type: execution, beacon, avax
    #[arg(long)]
    chain: ChainKind,

    /// Node port (default: 8545 for execution, 9650 for avax, 4000 for beacon)
    #[arg(long)]
    port: Option<u16>,

    /// Node host address
    #[arg(long, default_value = "localhost")]
    addr: String,

    /// Node connection timeout, seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Seconds without a new block before the node counts as stalled
    #[arg(long, default_value_t = 60)]
    stall_threshold: u64,

    /// Maximum age of the latest block, seconds
    #[arg(long, default_value_t = 300)]
    freshness_window: u64,

    /// Seconds between two evaluations
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    #[command(flatten)]
    execution: ExecutionArgs,

    #[command(flatten)]
    beacon: BeaconArgs,

    #[command(flatten)]
    http: HttpArgs,
}

#[derive(Args)]
#[command(next_help_heading = "Execution chain")]
struct ExecutionArgs {
    /// JWT hex secret path. Use only when connecting to the engine RPC endpoint.
    #[arg(long = "execution.engine-jwt")]
    engine_jwt: Option<PathBuf>,

    /// Max block lag tolerance while syncing
    #[arg(long = "execution.sync-tolerance", default_value_t = 0)]
    sync_tolerance: u64,
}

#[derive(Args)]
#[command(next_help_heading = "Beacon chain")]
struct BeaconArgs {
    /// TLS root certificate path. Specify only if you have it configured for your node as well.
    #[arg(long = "beacon.certificate")]
    certificate: Option<PathBuf>,
}

#[derive(Args)]
#[command(next_help_heading = "Healthcheck service")]
struct HttpArgs {
    /// healthmon listening port
    #[arg(id = "http.port", long = "http.port", default_value_t = 21171)]
    port: u16,

    /// healthmon listening address. Set to 0.0.0.0 to allow external access.
    #[arg(id = "http.addr", long = "http.addr", default_value = "localhost")]
    addr: String,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()?;
    let metrics = HealthmonMetrics::default();

    let node = NodeConfig {
        chain: cli.chain,
        host: cli.addr,
        port: cli.port,
        tls: cli.chain == ChainKind::Beacon && cli.beacon.certificate.is_some(),
    };
    let node_url = node.url()?;
    let timeout = Duration::from_secs(cli.timeout);
    let checks = CheckConfig {
        sync_tolerance: cli.execution.sync_tolerance,
        freshness_window: Duration::from_secs(cli.freshness_window),
        stall_threshold: Duration::from_secs(cli.stall_threshold),
    };
    let state = Arc::new(ReadinessState::new());

    let poller = match cli.chain {
        ChainKind::Execution | ChainKind::Avax => {
            let adapter = EthereumAdapter::new(node_url.clone(), timeout, checks, metrics.clone())?;
            let poller = Poller::new(adapter, state);
            match &cli.execution.engine_jwt {
                Some(path) => poller.with_issuer(JwtTokenIssuer::from_file(path)?),
                None => poller,
            }
        }
        ChainKind::Beacon => {
            let certificate = cli
                .beacon
                .certificate
                .as_deref()
                .map(load_certificate)
                .transpose()?;
            let adapter = EthereumBeaconAdapter::new(
                node_url.clone(),
                timeout,
                certificate,
                checks,
                metrics.clone(),
            )?;
            Poller::new(adapter, state)
        }
    };
    let poller = poller
        .with_interval(Duration::from_secs(cli.poll_interval))?
        .with_metrics(metrics);

    tracing::info!(
        "{} node address is {} (stall threshold {}s)",
        cli.chain,
        node_url,
        cli.stall_threshold
    );

    let server = HealthmonServer::new(poller).with_prometheus(prometheus_handle);
    server
        .serve(&format!("{}:{}", cli.http.addr, cli.http.port))
        .await?;

    Ok(())
}
