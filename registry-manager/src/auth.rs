use alloy::primitives::Address;
use alloy_primitives::PrimitiveSignature;
use dashmap::DashMap;
use rand_core::{OsRng, RngCore};

use crate::error::{ManagerError, ManagerResult};
use crate::helpers::{parse_address, to_checksum};

const NONCE_BYTES: usize = 32;

/// challenge handed to a wallet for signing. the nonce is single use: it is
/// rotated as soon as a signature over it verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginChallenge {
    pub wallet_address: String,
    pub nonce: String,
}

/// text the wallet signs as an eip-191 personal message
pub fn login_message(nonce: &str) -> String {
    format!("Sign this message to login: {nonce}")
}

/// issues and verifies single-use login challenges, proving wallet
/// ownership without the service ever seeing key material.
#[derive(Debug, Default)]
pub struct ChallengeStore {
    nonces: DashMap<Address, String>,
}

impl ChallengeStore {
    /// new challenge for the wallet, replacing any outstanding one
    pub fn issue(&self, wallet_address: &str) -> ManagerResult<LoginChallenge> {
        let wallet = parse_address(wallet_address)?;
        let nonce = random_nonce();
        self.nonces.insert(wallet, nonce.clone());

        Ok(LoginChallenge {
            wallet_address: to_checksum(&wallet),
            nonce,
        })
    }

    /// verify a signature over the outstanding challenge. on success the
    /// nonce is rotated so the signature cannot be replayed.
    pub fn verify(&self, wallet_address: &str, signature: &str) -> ManagerResult<()> {
        let wallet = parse_address(wallet_address)?;
        let nonce = self
            .nonces
            .get(&wallet)
            .map(|n| n.clone())
            .ok_or_else(|| ManagerError::ChallengeNotFound(wallet_address.to_string()))?;

        let raw = hex::decode(signature.trim_start_matches("0x"))
            .map_err(|e| ManagerError::InvalidSignature(e.to_string()))?;
        let signature = PrimitiveSignature::try_from(raw.as_slice())
            .map_err(|e| ManagerError::InvalidSignature(e.to_string()))?;

        let recovered = signature
            .recover_address_from_msg(login_message(&nonce))
            .map_err(|e| ManagerError::InvalidSignature(e.to_string()))?;

        if recovered != wallet {
            return Err(ManagerError::SignatureMismatch(to_checksum(&wallet)));
        }

        self.nonces.insert(wallet, random_nonce());

        Ok(())
    }
}

fn random_nonce() -> String {
    let mut buf = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
