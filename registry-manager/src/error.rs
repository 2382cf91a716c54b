use thiserror::Error;

use registry_chain_client::error::ClientError;

use crate::build_cache::BuildError;
use crate::config::ConfigError;

pub type ManagerResult<T> = Result<T, ManagerError>;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Config Error")]
    Config(#[from] ConfigError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid transaction hash: {0}")]
    InvalidTransactionHash(String),

    #[error("Failed to decode contract response: {0}")]
    ResponseDecode(String),

    #[error("No login challenge issued for wallet: {0}")]
    ChallengeNotFound(String),

    #[error("Malformed signature: {0}")]
    InvalidSignature(String),

    #[error("Signature does not match wallet: {0}")]
    SignatureMismatch(String),
}
