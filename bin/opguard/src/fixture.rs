//! Recorded validation call, as produced by a tracing harness.

use ethers::types::{Address, H256, U256};
use eyre::WrapErr;
use opguard_primitives::{constants::entry_point, TraceStep, UserOperation};
use opguard_validator::MemoryState;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, str::FromStr};

/// Stake of an entity on the entry point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeEntry {
    pub stake: U256,
    pub unstake_delay: U256,
}

/// Mapping entry written during the traced call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    pub contract: Address,
    pub key: H256,
    pub parent_slot: H256,
}

/// A user operation, the trace of its validation call and the state the call ran against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixture {
    pub user_operation: UserOperation,
    /// Defaults to the canonical entry point
    pub entry_point: Option<Address>,
    pub steps: Vec<TraceStep>,
    pub stakes: HashMap<Address, StakeEntry>,
    /// Addresses with deployed code
    pub code: Vec<Address>,
    pub labels: HashMap<Address, String>,
    pub mappings: Vec<MappingEntry>,
}

impl Fixture {
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read fixture {}", path.display()))?;
        serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse fixture {}", path.display()))
    }

    pub fn entry_point(&self) -> eyre::Result<Address> {
        match self.entry_point {
            Some(addr) => Ok(addr),
            None => Address::from_str(entry_point::ADDRESS)
                .wrap_err("Invalid canonical entry point address"),
        }
    }

    /// Collaborator state for the validation engine
    pub fn state(&self) -> MemoryState {
        let mut state = MemoryState::new();

        for (addr, entry) in self.stakes.iter() {
            state.set_stake(*addr, entry.stake, entry.unstake_delay);
        }
        for addr in self.code.iter() {
            state.set_code(*addr);
        }
        for (addr, label) in self.labels.iter() {
            state.set_label(*addr, label.clone());
        }
        for entry in self.mappings.iter() {
            state.record_mapping(entry.contract, entry.key, entry.parent_slot);
        }

        state
    }
}
