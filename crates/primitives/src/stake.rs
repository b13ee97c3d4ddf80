use educe::Educe;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

/// Entities whose code runs during validation of a user operation
#[derive(Clone, Copy, Debug, Display, IntoStaticStr, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityType {
    Factory,
    Account,
    Paymaster,
    Aggregator,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Stake info
#[derive(Clone, Copy, Default, Educe, Eq, PartialEq, Serialize, Deserialize)]
#[educe(Debug)]
#[serde(rename_all = "camelCase")]
pub struct StakeInfo {
    pub address: Address,
    pub stake: U256,
    pub unstake_delay: U256, // seconds
}

impl StakeInfo {
    /// An entity is staked when both its stake and its unstake delay reach the given minimums.
    pub fn is_staked(&self, min_stake: U256, min_unstake_delay: U256) -> bool {
        !self.address.is_zero() &&
            self.stake >= min_stake &&
            self.unstake_delay >= min_unstake_delay
    }
}
