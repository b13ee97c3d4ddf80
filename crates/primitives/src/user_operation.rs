//! Basic transaction type for account abstraction (ERC-4337)

use crate::utils::{as_checksum_addr, get_address};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// User operation
///
/// Only `sender`, `init_code` and `paymaster_and_data` take part in rule validation, the
/// remaining fields are carried so recorded operations round-trip unchanged.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserOperation {
    /// Sender of the user operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,

    /// Nonce (anti replay protection)
    pub nonce: U256,

    /// Init code for the account (needed if account not yet deployed and needs to be created)
    pub init_code: Bytes,

    /// The data that is passed to the sender during the main execution call
    pub call_data: Bytes,

    /// The amount of gas to allocate for the main execution call
    pub call_gas_limit: U256,

    /// The amount of gas to allocate for the verification step
    pub verification_gas_limit: U256,

    /// The amount of gas to pay bundler to compensate for the pre-verification execution and
    /// calldata
    pub pre_verification_gas: U256,

    /// Maximum fee per gas (similar to EIP-1559)
    pub max_fee_per_gas: U256,

    /// Maximum priority fee per gas (similar to EIP-1559)
    pub max_priority_fee_per_gas: U256,

    /// Address of paymaster sponsoring the user operation, followed by extra data to send to the
    /// paymaster (can be empty)
    pub paymaster_and_data: Bytes,

    /// Data passed to the account along with the nonce during the verification step
    pub signature: Bytes,
}

impl UserOperation {
    /// Factory deploying the sender, zero address if the sender already exists
    pub fn factory(&self) -> Address {
        get_address(&self.init_code).unwrap_or_default()
    }

    /// Paymaster sponsoring the user operation, zero address if the sender pays for itself
    pub fn paymaster(&self) -> Address {
        get_address(&self.paymaster_and_data).unwrap_or_default()
    }

    /// Whether the user operation deploys its sender
    pub fn has_init_code(&self) -> bool {
        !self.init_code.is_empty()
    }
}
