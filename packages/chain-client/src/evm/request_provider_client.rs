use alloy::{
    network::EthereumWallet,
    providers::ProviderBuilder,
    transports::http::reqwest,
};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::error::{ClientError, ClientResult};

use super::base_client::{CustomProvider, SigningProvider};

/// trait for evm-based clients to enable request provider functionality.
/// each implementation must provide a getter for the rpc url which is used
/// to build the provider.
///
/// the read/prepare flows never hold key material; the signing provider is
/// built only for the direct-submission path, from a signer handed in by
/// the caller.
#[async_trait]
pub trait RequestProviderClient {
    fn rpc_url(&self) -> String;

    async fn get_request_provider(&self) -> ClientResult<CustomProvider> {
        let url: reqwest::Url = self
            .rpc_url()
            .parse()
            .map_err(|_| ClientError::Parse("failed to parse url".to_string()))?;

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .on_http(url);

        Ok(provider)
    }

    async fn get_signing_provider(
        &self,
        signer: PrivateKeySigner,
    ) -> ClientResult<SigningProvider> {
        let url: reqwest::Url = self
            .rpc_url()
            .parse()
            .map_err(|_| ClientError::Parse("failed to parse url".to_string()))?;

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(signer))
            .on_http(url);

        Ok(provider)
    }
}
