use async_trait::async_trait;

use crate::evm::base_client::EvmBaseClient;
use crate::evm::request_provider_client::RequestProviderClient;

/// http client bound to one ethereum-compatible endpoint. holds no key
/// material; signing happens client side, or through a signer passed into
/// `execute_signed` on the demo path.
pub struct EthereumClient {
    pub rpc_url: String,
}

impl EthereumClient {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
        }
    }
}

#[async_trait]
impl EvmBaseClient for EthereumClient {}

#[async_trait]
impl RequestProviderClient for EthereumClient {
    fn rpc_url(&self) -> String {
        self.rpc_url.clone()
    }
}
