use alloy::sol;

use crate::transaction::UserData;

sol! {
    /// on-chain surface of the user data registry. the bytecode itself
    /// comes from the build cache at run time; these bindings only cover
    /// calldata encoding and return decoding.
    contract UserDataRegistry {
        constructor(address[] initialUsers);

        function updateUserData(string imageReference) external;

        function getUserData(address user)
            external
            view
            returns (string imageReference, uint256 updatedAt, bool exists);
    }
}

impl From<UserDataRegistry::getUserDataReturn> for UserData {
    fn from(ret: UserDataRegistry::getUserDataReturn) -> Self {
        // a zero timestamp means the entry was never written; surface that
        // as an absent value rather than the epoch
        let updated_at = if ret.exists && !ret.updatedAt.is_zero() {
            Some(ret.updatedAt.saturating_to::<u64>())
        } else {
            None
        };

        UserData {
            image_reference: ret.imageReference,
            updated_at,
            exists: ret.exists,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{keccak256, Address, U256};
    use alloy::sol_types::{SolCall, SolValue};

    use super::*;

    #[test]
    fn update_selector_matches_signature() {
        let hash = keccak256("updateUserData(string)".as_bytes());
        assert_eq!(UserDataRegistry::updateUserDataCall::SELECTOR, hash[..4]);
    }

    #[test]
    fn get_user_data_selector_matches_signature() {
        let hash = keccak256("getUserData(address)".as_bytes());
        assert_eq!(UserDataRegistry::getUserDataCall::SELECTOR, hash[..4]);
    }

    #[test]
    fn decodes_existing_entry() {
        let encoded = (
            "ipfs://QmExample".to_string(),
            U256::from(1_700_000_000u64),
            true,
        )
            .abi_encode_params();

        let ret =
            UserDataRegistry::getUserDataCall::abi_decode_returns(&encoded, true).unwrap();
        let data = UserData::from(ret);

        assert_eq!(data.image_reference, "ipfs://QmExample");
        assert_eq!(data.updated_at, Some(1_700_000_000));
        assert!(data.exists);
    }

    #[test]
    fn missing_entry_has_no_timestamp() {
        let encoded = (String::new(), U256::ZERO, false).abi_encode_params();

        let ret =
            UserDataRegistry::getUserDataCall::abi_decode_returns(&encoded, true).unwrap();
        let data = UserData::from(ret);

        assert_eq!(data.updated_at, None);
        assert!(!data.exists);
        assert!(data.image_reference.is_empty());
    }

    #[test]
    fn constructor_args_follow_the_bytecode() {
        let users = vec![Address::ZERO, Address::repeat_byte(0xbb)];
        let encoded = alloy::sol_types::SolConstructor::abi_encode(
            &UserDataRegistry::constructorCall {
                initialUsers: users.clone(),
            },
        );

        // constructor calldata is raw abi params: offset, length, entries
        assert_eq!(encoded.len(), 32 + 32 + 32 * users.len());
    }
}
