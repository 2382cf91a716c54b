use std::str::FromStr;

use alloy::primitives::{Address, TxHash};

use crate::error::{ManagerError, ManagerResult};

/// parse a user-supplied account address. malformed input is rejected here,
/// before any rpc call is made. accepts any casing.
pub fn parse_address(input: &str) -> ManagerResult<Address> {
    if !input.starts_with("0x") || input.len() != 42 {
        return Err(ManagerError::InvalidAddress(input.to_string()));
    }

    Address::from_str(input).map_err(|_| ManagerError::InvalidAddress(input.to_string()))
}

/// eip-55 checksummed rendering
pub fn to_checksum(address: &Address) -> String {
    address.to_checksum(None)
}

pub fn parse_tx_hash(input: &str) -> ManagerResult<TxHash> {
    if !input.starts_with("0x") || input.len() != 66 {
        return Err(ManagerError::InvalidTransactionHash(input.to_string()));
    }

    TxHash::from_str(input).map_err(|_| ManagerError::InvalidTransactionHash(input.to_string()))
}

/// initial-user set for a deployment: deduplicated, owner always present
/// and always first
pub fn normalize_initial_users(
    owner: Address,
    requested: &[String],
) -> ManagerResult<Vec<Address>> {
    let mut users = vec![owner];
    for raw in requested {
        let addr = parse_address(raw.trim())?;
        if !users.contains(&addr) {
            users.push(addr);
        }
    }

    Ok(users)
}

/// split a newline-separated address block into validated entries. blank
/// lines are skipped; the first malformed entry fails the whole block.
pub fn parse_whitelist(text: &str) -> ManagerResult<Vec<String>> {
    let mut addresses = Vec::new();
    for line in text.lines() {
        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }
        parse_address(entry)?;
        addresses.push(entry.to_string());
    }

    Ok(addresses)
}
