use std::str::FromStr;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::rpc::types::TransactionRequest;
use serde::{Deserialize, Serialize};

use crate::error::{ManagerError, ManagerResult};

/// transaction descriptor handed to a client-side signer (metamask style).
/// numeric fields are hex encoded per wallet-signer convention; `to` is
/// omitted entirely for contract creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransactionRequest {
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub data: String,
    pub gas: String,
    pub gas_price: String,
    pub chain_id: String,
}

impl UnsignedTransactionRequest {
    /// rebuild an rpc transaction request from the descriptor. used by the
    /// direct-submission path; the nonce is filled at submission time.
    pub fn to_transaction_request(&self) -> ManagerResult<TransactionRequest> {
        let from = Address::from_str(&self.from)
            .map_err(|_| ManagerError::InvalidAddress(self.from.clone()))?;

        let data = hex::decode(self.data.trim_start_matches("0x"))
            .map_err(|e| ManagerError::ResponseDecode(format!("bad tx data: {e}")))?;

        let mut tx = TransactionRequest::default()
            .with_from(from)
            .with_input(Bytes::from(data))
            .with_gas_limit(parse_hex_u64(&self.gas)?)
            .with_gas_price(parse_hex_u128(&self.gas_price)?)
            .with_chain_id(parse_hex_u64(&self.chain_id)?);

        match &self.to {
            Some(to) => {
                let to =
                    Address::from_str(to).map_err(|_| ManagerError::InvalidAddress(to.clone()))?;
                tx = tx.with_to(to);
            }
            // contract creation
            None => tx = tx.with_kind(TxKind::Create),
        }

        Ok(tx)
    }
}

/// result of the direct-submission path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSubmission {
    pub transaction_hash: String,
    pub gas_used: u64,
    /// populated for contract-creation transactions
    pub contract_address: Option<String>,
}

/// deployment metadata handed to the persistence collaborator once a signed
/// transaction is confirmed. the orchestrator only supplies the fields; it
/// does not own the record's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract_address: String,
    pub transaction_hash: String,
    pub network: String,
    pub deployed_at: u64,
}

/// one on-chain registry entry as returned by the view function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub image_reference: String,
    pub updated_at: Option<u64>,
    pub exists: bool,
}

fn parse_hex_u64(raw: &str) -> ManagerResult<u64> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| ManagerError::ResponseDecode(format!("bad hex quantity {raw}: {e}")))
}

fn parse_hex_u128(raw: &str) -> ManagerResult<u128> {
    u128::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| ManagerError::ResponseDecode(format!("bad hex quantity {raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deploy_descriptor() -> UnsignedTransactionRequest {
        UnsignedTransactionRequest {
            from: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            to: None,
            data: "0x6080604052".to_string(),
            gas: "0x4c4b40".to_string(),
            gas_price: "0x3b9aca00".to_string(),
            chain_id: "0xaa36a7".to_string(),
        }
    }

    #[test]
    fn deploy_descriptor_omits_to_field() {
        let json = serde_json::to_value(deploy_descriptor()).unwrap();

        assert!(json.get("to").is_none());
        assert_eq!(json["gas"], "0x4c4b40");
        assert_eq!(json["gasPrice"], "0x3b9aca00");
        assert_eq!(json["chainId"], "0xaa36a7");
    }

    #[test]
    fn call_descriptor_keeps_to_field() {
        let mut descriptor = deploy_descriptor();
        descriptor.to = Some("0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string());

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["to"], "0x5FbDB2315678afecb367f032d93F642f64180aa3");
    }

    #[test]
    fn descriptor_round_trips_through_json() {
        let descriptor = deploy_descriptor();
        let json = serde_json::to_string(&descriptor).unwrap();
        let back: UnsignedTransactionRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(descriptor, back);
    }

    #[test]
    fn rebuilds_rpc_request_from_descriptor() {
        let tx = deploy_descriptor().to_transaction_request().unwrap();

        assert_eq!(tx.gas, Some(5_000_000));
        assert_eq!(tx.gas_price, Some(1_000_000_000));
        assert_eq!(tx.chain_id, Some(11155111));
        assert_eq!(tx.to, Some(TxKind::Create));
    }

    #[test]
    fn rejects_malformed_gas_quantity() {
        let mut descriptor = deploy_descriptor();
        descriptor.gas = "0xnope".to_string();

        assert!(descriptor.to_transaction_request().is_err());
    }
}
