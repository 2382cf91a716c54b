use dashmap::DashMap;

use registry_chain_client::error::ClientError;

use crate::deployer::DeploymentOrchestrator;
use crate::error::{ManagerError, ManagerResult};
use crate::helpers::{parse_address, to_checksum};

/// local copy of one on-chain registry entry. the chain is authoritative;
/// this record may be stale until `refresh` is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryMembership {
    pub wallet_address: String,
    pub is_authorized: bool,
    pub cached_image_reference: Option<String>,
    pub last_updated: Option<u64>,
}

/// read-cache of registry entries keyed by (registry address, wallet
/// address); the pair is unique, matching the persistence collaborator's
/// constraint. keys are checksum-normalized so lookups are case
/// insensitive.
#[derive(Debug, Default)]
pub struct MembershipCache {
    entries: DashMap<(String, String), RegistryMembership>,
}

impl MembershipCache {
    pub fn get(&self, registry: &str, wallet: &str) -> ManagerResult<Option<RegistryMembership>> {
        let key = cache_key(registry, wallet)?;
        Ok(self.entries.get(&key).map(|entry| entry.clone()))
    }

    /// record a wallet that was part of a confirmed deployment's initial
    /// authorization list, before any on-chain read has happened
    pub fn seed(&self, registry: &str, wallet: &str) -> ManagerResult<RegistryMembership> {
        let key = cache_key(registry, wallet)?;
        let membership = RegistryMembership {
            wallet_address: key.1.clone(),
            is_authorized: true,
            cached_image_reference: None,
            last_updated: None,
        };
        self.entries.insert(key, membership.clone());

        Ok(membership)
    }

    /// re-read the on-chain entry and overwrite the local copy. a reverted
    /// read means the wallet is not authorized; that outcome is cached
    /// rather than surfaced as an error.
    pub async fn refresh(
        &self,
        orchestrator: &DeploymentOrchestrator,
        registry: &str,
        wallet: &str,
    ) -> ManagerResult<RegistryMembership> {
        let key = cache_key(registry, wallet)?;

        let membership = match orchestrator.read_user_data(registry, wallet).await {
            Ok(data) => RegistryMembership {
                wallet_address: key.1.clone(),
                is_authorized: true,
                cached_image_reference: data.exists.then_some(data.image_reference),
                last_updated: data.updated_at,
            },
            Err(ManagerError::Client(ClientError::Reverted(_))) => RegistryMembership {
                wallet_address: key.1.clone(),
                is_authorized: false,
                cached_image_reference: None,
                last_updated: None,
            },
            Err(e) => return Err(e),
        };

        self.entries.insert(key, membership.clone());

        Ok(membership)
    }
}

fn cache_key(registry: &str, wallet: &str) -> ManagerResult<(String, String)> {
    let registry = parse_address(registry)?;
    let wallet = parse_address(wallet)?;

    Ok((to_checksum(&registry), to_checksum(&wallet)))
}
