//! Capabilities the validation engine consumes from the harness that produced the trace.
//!
//! Implementations must answer for the state the validation call was simulated against and must
//! not change while a validation pass runs.

use ethers::types::{Address, H256};
use opguard_primitives::StakeInfo;

/// Stake deposited by entities on the entry point
pub trait StakeRegistry: Send + Sync {
    /// Returns the deposit of `address` on `entry_point`, default stake info if nothing is
    /// deposited.
    fn deposit_info(&self, entry_point: &Address, address: &Address) -> StakeInfo;
}

/// Code deployed at addresses
pub trait CodeProvider: Send + Sync {
    fn has_code(&self, address: &Address) -> bool;
}

/// Human readable names of addresses, only used to enrich violation reports
pub trait AddressLabeler: Send + Sync {
    fn label(&self, address: &Address) -> Option<String>;
}

/// A storage slot produced by a mapping write, `slot = keccak256(key ∥ parent_slot)`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MappingSlot {
    pub key: H256,
    pub parent_slot: H256,
}

/// Keyed mapping writes observed while the validation call was traced
pub trait MappingRecorder: Send + Sync {
    /// Returns the key and parent slot that produced `slot` in the storage of `contract`.
    fn resolve(&self, contract: &Address, slot: &H256) -> Option<MappingSlot>;
}

impl<A, B> MappingRecorder for (&A, &B)
where
    A: MappingRecorder + ?Sized,
    B: MappingRecorder + ?Sized,
{
    fn resolve(&self, contract: &Address, slot: &H256) -> Option<MappingSlot> {
        self.0.resolve(contract, slot).or_else(|| self.1.resolve(contract, slot))
    }
}
