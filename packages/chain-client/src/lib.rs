pub mod error;
pub mod ethereum;
pub mod evm;
