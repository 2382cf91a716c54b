use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// rpc endpoint used when the requested network has no configured entry
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";

const DEFAULT_SOLC_VERSION: &str = "0.8.15";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
}

/// settings for the deployment manager: where the registry contract source
/// lives, which compiler builds it, and which networks it can be deployed
/// to.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagerConfig {
    pub contract_source: PathBuf,
    #[serde(default = "default_solc_version")]
    pub solc_version: String,
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,
}

fn default_solc_version() -> String {
    DEFAULT_SOLC_VERSION.to_string()
}

impl ManagerConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }

    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }

    /// config pointing at the local development node only
    pub fn local(contract_source: impl Into<PathBuf>) -> Self {
        Self {
            contract_source: contract_source.into(),
            solc_version: default_solc_version(),
            networks: HashMap::new(),
        }
    }

    /// rpc endpoint for the given network name. unknown names fall back to
    /// the local development node.
    pub fn rpc_url(&self, network: &str) -> String {
        self.networks
            .get(network)
            .map(|n| n.rpc_url.clone())
            .unwrap_or_else(|| LOCAL_RPC_URL.to_string())
    }
}
