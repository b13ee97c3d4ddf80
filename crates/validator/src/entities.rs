//! Participants of a user operation and their stake status.

use crate::state::StakeRegistry;
use ethers::types::Address;
use opguard_primitives::{EntityType, UserOperation, ValidationConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Address of an entity and whether it is staked, zero address if the entity is absent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityInfo {
    pub address: Address,
    pub is_staked: bool,
}

impl EntityInfo {
    pub fn is_present(&self) -> bool {
        !self.address.is_zero()
    }

    /// Whether the entity is present and its address is `address`
    pub fn is(&self, address: &Address) -> bool {
        self.is_present() && self.address == *address
    }
}

/// Entities of a user operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entities {
    /// The sender, always present and always trusted with its own storage
    pub account: Address,
    pub factory: EntityInfo,
    pub paymaster: EntityInfo,
    /// Aggregators are not supported, always absent
    pub aggregator: EntityInfo,
}

impl Entities {
    /// Resolves the entities of `uo` and their stake status on `entry_point`.
    pub fn resolve<R>(
        uo: &UserOperation,
        entry_point: &Address,
        registry: &R,
        val_config: &ValidationConfig,
    ) -> Self
    where
        R: StakeRegistry + ?Sized,
    {
        let stake_status = |address: Address| -> EntityInfo {
            if address.is_zero() {
                return EntityInfo::default();
            }

            let info = registry.deposit_info(entry_point, &address);
            EntityInfo {
                address,
                is_staked: info
                    .is_staked(val_config.min_stake, val_config.min_unstake_delay),
            }
        };

        let entities = Self {
            account: uo.sender,
            factory: stake_status(uo.factory()),
            paymaster: stake_status(uo.paymaster()),
            aggregator: EntityInfo::default(),
        };

        debug!(
            "Entities of user operation from {:?}: factory {:?} (staked: {}), paymaster {:?} (staked: {})",
            entities.account,
            entities.factory.address,
            entities.factory.is_staked,
            entities.paymaster.address,
            entities.paymaster.is_staked
        );

        entities
    }

    /// The role `address` plays in the user operation, if any
    pub fn entity_type(&self, address: &Address) -> Option<EntityType> {
        if address.is_zero() {
            None
        } else if *address == self.account {
            Some(EntityType::Account)
        } else if self.factory.is(address) {
            Some(EntityType::Factory)
        } else if self.paymaster.is(address) {
            Some(EntityType::Paymaster)
        } else if self.aggregator.is(address) {
            Some(EntityType::Aggregator)
        } else {
            None
        }
    }

    pub fn is_entity(&self, address: &Address) -> bool {
        self.entity_type(address).is_some()
    }

    /// Whether `address` is a staked factory, paymaster or aggregator
    pub fn is_staked(&self, address: &Address) -> bool {
        self.staked().any(|e| e.is(address))
    }

    /// Staked factory, paymaster and aggregator
    pub fn staked(&self) -> impl Iterator<Item = &EntityInfo> {
        [&self.factory, &self.paymaster, &self.aggregator]
            .into_iter()
            .filter(|e| e.is_present() && e.is_staked)
    }
}
