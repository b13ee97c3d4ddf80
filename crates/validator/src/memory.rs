use crate::{
    mapping::TraceMappingRecorder,
    state::{AddressLabeler, CodeProvider, MappingRecorder, MappingSlot, StakeRegistry},
};
use ethers::types::{Address, H256, U256};
use opguard_primitives::StakeInfo;
use std::collections::{HashMap, HashSet};

/// In-memory snapshot of the state a validation call was traced against.
#[derive(Clone, Debug, Default)]
pub struct MemoryState {
    stakes: HashMap<Address, StakeInfo>,
    code: HashSet<Address>,
    labels: HashMap<Address, String>,
    mappings: TraceMappingRecorder,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deposit of `address`. Deposits are not kept per entry point, one registry
    /// snapshot belongs to a single entry point.
    pub fn set_stake(&mut self, address: Address, stake: U256, unstake_delay: U256) {
        self.stakes.insert(address, StakeInfo { address, stake, unstake_delay });
    }

    pub fn set_code(&mut self, address: Address) {
        self.code.insert(address);
    }

    pub fn set_label(&mut self, address: Address, label: impl Into<String>) {
        self.labels.insert(address, label.into());
    }

    /// Records a mapping write, returns the slot of the entry.
    pub fn record_mapping(&mut self, contract: Address, key: H256, parent_slot: H256) -> H256 {
        self.mappings.record(contract, key, parent_slot)
    }

    pub fn with_stake(mut self, address: Address, stake: U256, unstake_delay: U256) -> Self {
        self.set_stake(address, stake, unstake_delay);
        self
    }

    pub fn with_code(mut self, address: Address) -> Self {
        self.set_code(address);
        self
    }

    pub fn with_label(mut self, address: Address, label: impl Into<String>) -> Self {
        self.set_label(address, label);
        self
    }
}

impl StakeRegistry for MemoryState {
    fn deposit_info(&self, _entry_point: &Address, address: &Address) -> StakeInfo {
        self.stakes
            .get(address)
            .copied()
            .unwrap_or(StakeInfo { address: *address, ..Default::default() })
    }
}

impl CodeProvider for MemoryState {
    fn has_code(&self, address: &Address) -> bool {
        self.code.contains(address)
    }
}

impl AddressLabeler for MemoryState {
    fn label(&self, address: &Address) -> Option<String> {
        self.labels.get(address).cloned()
    }
}

impl MappingRecorder for MemoryState {
    fn resolve(&self, contract: &Address, slot: &H256) -> Option<MappingSlot> {
        self.mappings.resolve(contract, slot)
    }
}
