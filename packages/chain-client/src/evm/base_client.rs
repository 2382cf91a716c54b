use std::time::Duration;

use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::{
    fillers::{
        BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    Identity, Provider, RootProvider,
};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::http::{Client, Http};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::error::{ClientError, ClientResult};

use super::request_provider_client::RequestProviderClient;

pub type CustomProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Http<Client>>,
    Http<Client>,
    Ethereum,
>;

pub type SigningProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Http<Client>>,
    Http<Client>,
    Ethereum,
>;

/// transient faults during chain-state fetches are retried this many times
/// before surfacing to the caller
const STATE_FETCH_ATTEMPTS: u32 = 3;
const STATE_FETCH_DELAY: Duration = Duration::from_millis(500);

/// base client trait with default implementations for evm based clients.
///
/// all operations are bounded sequences of rpc calls; the only blocking
/// wait is `execute_signed`, which is capped by the timeout it is given.
#[async_trait]
pub trait EvmBaseClient: RequestProviderClient {
    /// chain id of the bound endpoint. doubles as the fail-fast
    /// connectivity probe at client construction.
    async fn query_chain_id(&self) -> ClientResult<u64> {
        let client = self.get_request_provider().await?;

        let chain_id = client.get_chain_id().await?;

        Ok(chain_id)
    }

    async fn latest_block_height(&self) -> ClientResult<u64> {
        let client = self.get_request_provider().await?;

        let block = client.get_block_number().await?;

        Ok(block)
    }

    async fn query_gas_price(&self) -> ClientResult<u128> {
        let client = self.get_request_provider().await?;

        let mut attempt = 1;
        loop {
            match client.get_gas_price().await {
                Ok(price) => return Ok(price),
                Err(e) => {
                    if attempt >= STATE_FETCH_ATTEMPTS {
                        return Err(e.into());
                    }
                    log::warn!(
                        "gas price fetch attempt {attempt}/{STATE_FETCH_ATTEMPTS} failed: {e}"
                    );
                    attempt += 1;
                    tokio::time::sleep(STATE_FETCH_DELAY).await;
                }
            }
        }
    }

    async fn query_nonce(&self, address: Address) -> ClientResult<u64> {
        let client = self.get_request_provider().await?;

        let mut attempt = 1;
        loop {
            match client.get_transaction_count(address).await {
                Ok(nonce) => return Ok(nonce),
                Err(e) => {
                    if attempt >= STATE_FETCH_ATTEMPTS {
                        return Err(e.into());
                    }
                    log::warn!("nonce fetch attempt {attempt}/{STATE_FETCH_ATTEMPTS} failed: {e}");
                    attempt += 1;
                    tokio::time::sleep(STATE_FETCH_DELAY).await;
                }
            }
        }
    }

    /// gas estimate for the given request. not retried; callers degrade to
    /// a fallback limit instead of failing the operation.
    async fn estimate_gas(&self, tx: &TransactionRequest) -> ClientResult<u64> {
        let client = self.get_request_provider().await?;

        let estimate = client.estimate_gas(tx).await?;

        Ok(estimate)
    }

    /// raw eth_call. reverts come back as `ClientError::Reverted`.
    async fn query_call(&self, tx: &TransactionRequest) -> ClientResult<Bytes> {
        let client = self.get_request_provider().await?;

        let raw_response = client.call(tx).await?;

        Ok(raw_response)
    }

    /// sign with the caller-supplied key, broadcast and wait for the
    /// receipt. gives up with a distinct timeout error once `timeout`
    /// elapses instead of hanging on a transaction the chain never mines.
    async fn execute_signed(
        &self,
        signer: PrivateKeySigner,
        tx: TransactionRequest,
        timeout: Duration,
    ) -> ClientResult<TransactionReceipt> {
        let sender = signer.address();
        let client = self.get_signing_provider(signer).await?;

        let signed_tx = tx.with_from(sender);
        let pending = client.send_transaction(signed_tx).await?;

        match tokio::time::timeout(timeout, pending.get_receipt()).await {
            Ok(receipt) => Ok(receipt?),
            Err(_) => Err(ClientError::Timeout(format!(
                "no receipt observed within {}s",
                timeout.as_secs()
            ))),
        }
    }
}
