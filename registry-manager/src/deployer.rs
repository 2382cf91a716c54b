use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy::network::TransactionBuilder;
use alloy::primitives::Bytes;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{SolCall, SolConstructor};
use alloy_signer_local::PrivateKeySigner;
use log::{info, warn};
use semver::Version;

use registry_chain_client::error::{ClientError, ClientResult};
use registry_chain_client::ethereum::EthereumClient;
use registry_chain_client::evm::base_client::EvmBaseClient;

use crate::build_cache::{BuildError, ContractBuildCache, SolcToolchain};
use crate::config::ManagerConfig;
use crate::contract::UserDataRegistry;
use crate::error::{ManagerError, ManagerResult};
use crate::helpers::{normalize_initial_users, parse_address, parse_tx_hash, to_checksum};
use crate::transaction::{
    DeploymentRecord, TransactionSubmission, UnsignedTransactionRequest, UserData,
};

/// fallback gas limits when estimation fails. availability over precision:
/// a bad estimate degrades the request, it does not abort it.
const DEPLOY_GAS_FALLBACK: u64 = 5_000_000;
const UPDATE_GAS_FALLBACK: u64 = 200_000;

/// 20% buffer on top of a successful estimate
const GAS_BUFFER_NUM: u64 = 12;
const GAS_BUFFER_DEN: u64 = 10;

/// receipt wait bound for the direct submission path
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// prepares, submits and reads registry transactions against one network
/// endpoint. holds no mutable state beyond the network binding and the
/// build cache, so one instance can serve concurrent requests.
pub struct DeploymentOrchestrator {
    network: String,
    chain_id: u64,
    client: EthereumClient,
    build_cache: ContractBuildCache,
    solc_version: Version,
}

impl DeploymentOrchestrator {
    /// bind to a network endpoint with the production solc toolchain.
    /// probes the endpoint and fails fast when it is unreachable.
    pub async fn connect(network: &str, config: &ManagerConfig) -> ManagerResult<Self> {
        let build_cache = ContractBuildCache::with_svm(&config.contract_source);
        Self::connect_with_cache(network, config, build_cache).await
    }

    /// same as `connect` but with a caller-supplied toolchain. used by
    /// tests to stub out compilation.
    pub async fn connect_with_toolchain(
        network: &str,
        config: &ManagerConfig,
        toolchain: Box<dyn SolcToolchain>,
    ) -> ManagerResult<Self> {
        let build_cache = ContractBuildCache::new(&config.contract_source, toolchain);
        Self::connect_with_cache(network, config, build_cache).await
    }

    async fn connect_with_cache(
        network: &str,
        config: &ManagerConfig,
        build_cache: ContractBuildCache,
    ) -> ManagerResult<Self> {
        let solc_version = Version::parse(&config.solc_version).map_err(|e| {
            BuildError::CompilerUnavailable(format!(
                "invalid solc version {}: {e}",
                config.solc_version
            ))
        })?;

        let client = EthereumClient::new(&config.rpc_url(network));
        let chain_id = client.query_chain_id().await.map_err(|e| {
            ClientError::Connection(format!("cannot reach {network} endpoint: {e}"))
        })?;

        info!("orchestrator bound to {network} (chain id {chain_id})");

        Ok(Self {
            network: network.to_string(),
            chain_id,
            client,
            build_cache,
            solc_version,
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// unsigned deployment descriptor for client-side signing. the
    /// initial-user set is deduplicated and always led by the owner.
    pub async fn prepare_deployment(
        &self,
        owner_address: &str,
        initial_users: &[String],
    ) -> ManagerResult<UnsignedTransactionRequest> {
        let owner = parse_address(owner_address)?;
        let users = normalize_initial_users(owner, initial_users)?;

        let artifact = self.build_cache.compile(&self.solc_version).await?;
        let mut data = artifact.bytecode_bytes()?;
        data.extend_from_slice(
            &UserDataRegistry::constructorCall {
                initialUsers: users.clone(),
            }
            .abi_encode(),
        );

        let gas_price = self.client.query_gas_price().await?;

        let tx = TransactionRequest::default()
            .with_from(owner)
            .with_deploy_code(data.clone());
        let gas_limit =
            gas_limit_or_fallback(self.client.estimate_gas(&tx).await, DEPLOY_GAS_FALLBACK);

        info!(
            "prepared deployment for {} with {} initial users",
            to_checksum(&owner),
            users.len()
        );

        Ok(UnsignedTransactionRequest {
            from: to_checksum(&owner),
            to: None,
            data: format!("0x{}", hex::encode(data)),
            gas: format!("{gas_limit:#x}"),
            gas_price: format!("{gas_price:#x}"),
            chain_id: format!("{:#x}", self.chain_id),
        })
    }

    /// bookkeeping for a deployment the caller signed and broadcast
    /// elsewhere. validates shapes only; there is no on-chain confirmation
    /// polling, the caller is trusted on the hash.
    pub fn confirm_deployment(
        &self,
        transaction_hash: &str,
        contract_address: &str,
    ) -> ManagerResult<DeploymentRecord> {
        let contract = parse_address(contract_address)?;
        let hash = parse_tx_hash(transaction_hash)?;

        Ok(DeploymentRecord {
            contract_address: to_checksum(&contract),
            transaction_hash: format!("{hash:#x}"),
            network: self.network.clone(),
            deployed_at: now_epoch_secs(),
        })
    }

    /// unsigned update descriptor targeting an already-deployed registry
    pub async fn prepare_user_data_update(
        &self,
        contract_address: &str,
        wallet_address: &str,
        image_reference: &str,
    ) -> ManagerResult<UnsignedTransactionRequest> {
        let contract = parse_address(contract_address)?;
        let wallet = parse_address(wallet_address)?;

        let data = UserDataRegistry::updateUserDataCall {
            imageReference: image_reference.to_string(),
        }
        .abi_encode();

        let gas_price = self.client.query_gas_price().await?;

        let tx = TransactionRequest::default()
            .with_from(wallet)
            .with_to(contract)
            .with_input(Bytes::from(data.clone()));
        let gas_limit =
            gas_limit_or_fallback(self.client.estimate_gas(&tx).await, UPDATE_GAS_FALLBACK);

        Ok(UnsignedTransactionRequest {
            from: to_checksum(&wallet),
            to: Some(to_checksum(&contract)),
            data: format!("0x{}", hex::encode(data)),
            gas: format!("{gas_limit:#x}"),
            gas_price: format!("{gas_price:#x}"),
            chain_id: format!("{:#x}", self.chain_id),
        })
    }

    /// direct submission with a caller-supplied key. this hands key
    /// material to the service process, which the prepare/confirm flow
    /// exists to avoid; kept only for local development against a dev
    /// node.
    pub async fn submit_signed(
        &self,
        request: &UnsignedTransactionRequest,
        signer: PrivateKeySigner,
    ) -> ManagerResult<TransactionSubmission> {
        let sender = parse_address(&request.from)?;
        let nonce = self.client.query_nonce(sender).await?;

        let tx = request.to_transaction_request()?.with_nonce(nonce);
        let receipt = self.client.execute_signed(signer, tx, RECEIPT_TIMEOUT).await?;

        Ok(TransactionSubmission {
            transaction_hash: format!("{:#x}", receipt.transaction_hash),
            gas_used: receipt.gas_used as u64,
            contract_address: receipt.contract_address.map(|a| to_checksum(&a)),
        })
    }

    /// read one registry entry. a revert means the wallet is not on the
    /// registry's authorization list.
    pub async fn read_user_data(
        &self,
        contract_address: &str,
        wallet_address: &str,
    ) -> ManagerResult<UserData> {
        let contract = parse_address(contract_address)?;
        let wallet = parse_address(wallet_address)?;

        let call = UserDataRegistry::getUserDataCall { user: wallet };
        let tx = TransactionRequest::default()
            .with_to(contract)
            .with_input(Bytes::from(call.abi_encode()));

        let raw = self.client.query_call(&tx).await?;
        let ret = UserDataRegistry::getUserDataCall::abi_decode_returns(&raw, true)
            .map_err(|e| ManagerError::ResponseDecode(e.to_string()))?;

        Ok(UserData::from(ret))
    }
}

fn gas_limit_or_fallback(estimate: ClientResult<u64>, fallback: u64) -> u64 {
    match estimate {
        Ok(estimate) => estimate * GAS_BUFFER_NUM / GAS_BUFFER_DEN,
        Err(e) => {
            warn!("gas estimation failed, using fallback limit {fallback}: {e}");
            fallback
        }
    }
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
