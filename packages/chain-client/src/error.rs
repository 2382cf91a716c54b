use alloy::providers::PendingTransactionError;
use alloy::transports::{RpcError, TransportErrorKind};

pub type ClientResult<T> = Result<T, ClientError>;

/// error type returned by the evm client layer. callers branch on the
/// variant instead of string-matching messages.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("transaction timeout: {0}")]
    Timeout(String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<RpcError<TransportErrorKind>> for ClientError {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        // a revert surfaces as an rpc error response; callers need it as a
        // distinct variant (it usually means the address is not authorized)
        match err.as_error_resp() {
            Some(payload) if payload.message.contains("revert") => {
                ClientError::Reverted(payload.message.to_string())
            }
            _ => ClientError::Rpc(err.to_string()),
        }
    }
}

impl From<PendingTransactionError> for ClientError {
    fn from(err: PendingTransactionError) -> Self {
        ClientError::Rpc(err.to_string())
    }
}
