use std::{fmt, path::Path, str::FromStr};
use url::Url;

/// Path of the C-chain JSON-RPC endpoint on an avalanche node.
const AVAX_RPC_PATH: &str = "/ext/bc/C/rpc";

/// Chain family of the monitored node, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Execution,
    Beacon,
    Avax,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chain: {0}. Supported chains: execution, beacon, avax")]
pub struct UnknownChainKind(String);

impl ChainKind {
    pub fn default_port(self) -> u16 {
        match self {
            ChainKind::Execution => 8545,
            ChainKind::Beacon => 4000,
            ChainKind::Avax => 9650,
        }
    }

    fn endpoint_path(self) -> &'static str {
        match self {
            ChainKind::Avax => AVAX_RPC_PATH,
            ChainKind::Execution | ChainKind::Beacon => "",
        }
    }
}

impl FromStr for ChainKind {
    type Err = UnknownChainKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "execution" => Ok(ChainKind::Execution),
            "beacon" => Ok(ChainKind::Beacon),
            "avax" => Ok(ChainKind::Avax),
            other => Err(UnknownChainKind(other.to_string())),
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainKind::Execution => "execution",
            ChainKind::Beacon => "beacon",
            ChainKind::Avax => "avax",
        };
        f.write_str(name)
    }
}

/// Where the monitored node listens.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub chain: ChainKind,
    pub host: String,
    /// Falls back to the chain's default port.
    pub port: Option<u16>,
    /// Use https when no scheme is given (beacon nodes with a TLS certificate).
    pub tls: bool,
}

impl NodeConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.chain.default_port())
    }

    /// Target URL. A port already present in `host` wins over `port`.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        let host = if self.host.contains("://") {
            self.host.clone()
        } else {
            let scheme = if self.tls { "https" } else { "http" };
            format!("{}://{}", scheme, self.host)
        };

        let mut url = Url::parse(&host)?;
        if url.port().is_none() {
            url.set_port(Some(self.port()))
                .map_err(|_| url::ParseError::InvalidPort)?;
        }
        url.set_path(self.chain.endpoint_path());
        Ok(url)
    }
}

/// Loads a PEM root certificate to trust for the node's TLS endpoint.
pub fn load_certificate(path: &Path) -> eyre::Result<reqwest::Certificate> {
    let pem = std::fs::read(path)
        .map_err(|e| eyre::eyre!("failed to read certificate {}: {}", path.display(), e))?;
    Ok(reqwest::Certificate::from_pem(&pem)?)
}
