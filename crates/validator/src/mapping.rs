//! Recovering the mapping key behind a storage slot.

use crate::state::{MappingRecorder, MappingSlot};
use ethers::{
    types::{Address, H256, U256},
    utils::keccak256,
};
use opguard_primitives::{
    constants::validation::storage::MAX_STRUCT_OFFSET_LIMIT, Opcode, TraceStep,
};
use std::collections::HashMap;
use tracing::trace;

/// Mapping entry found for an accessed slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedSlot {
    pub key: H256,
    pub parent_slot: H256,
    /// Distance between the accessed slot and the slot of the mapping value (the field offset
    /// inside a struct value)
    pub offset: u64,
}

/// Resolves `slot` of `contract` to the mapping key that produced it.
///
/// A miss on the slot itself is retried on `slot - 1` down to `slot - max_offset`, which
/// recovers fields of struct values stored in a mapping. The search stops at slot zero.
/// `max_offset` is clamped to [MAX_STRUCT_OFFSET_LIMIT].
pub fn resolve_mapping_slot<R>(
    recorder: &R,
    contract: &Address,
    slot: &H256,
    max_offset: u64,
) -> Option<ResolvedSlot>
where
    R: MappingRecorder + ?Sized,
{
    let slot_num = U256::from_big_endian(slot.as_bytes());

    for offset in 0..=max_offset.min(MAX_STRUCT_OFFSET_LIMIT) {
        let Some(candidate) = slot_num.checked_sub(U256::from(offset)) else {
            break;
        };

        let mut word = H256::zero();
        candidate.to_big_endian(word.as_bytes_mut());

        if let Some(MappingSlot { key, parent_slot }) = recorder.resolve(contract, &word) {
            trace!("Slot {slot:?} of {contract:?} resolved to key {key:?} at offset {offset}");
            return Some(ResolvedSlot { key, parent_slot, offset });
        }
    }

    None
}

/// Mapping recorder learning entries from the KECCAK256 instructions of a trace.
///
/// Solidity derives the slot of `m[key]` as `keccak256(key ∥ slot(m))`, so every 64-byte
/// preimage hashed by a contract is a candidate mapping entry of that contract.
#[derive(Clone, Debug, Default)]
pub struct TraceMappingRecorder {
    entries: HashMap<Address, HashMap<H256, MappingSlot>>,
}

impl TraceMappingRecorder {
    pub fn from_steps<'a, I>(steps: I) -> Self
    where
        I: IntoIterator<Item = &'a TraceStep>,
    {
        let mut recorder = Self::default();

        for step in steps {
            if step.opcode != Opcode::KECCAK256 || step.memory_input.len() != 64 {
                continue;
            }

            let key = H256::from_slice(&step.memory_input[0..32]);
            let parent_slot = H256::from_slice(&step.memory_input[32..64]);
            recorder.record(step.contract, key, parent_slot);
        }

        recorder
    }

    /// Records the entry `key` of the mapping at `parent_slot`, returns the slot of the entry.
    pub fn record(&mut self, contract: Address, key: H256, parent_slot: H256) -> H256 {
        let slot = mapping_slot(&key, &parent_slot);
        self.entries.entry(contract).or_default().insert(slot, MappingSlot { key, parent_slot });
        slot
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MappingRecorder for TraceMappingRecorder {
    fn resolve(&self, contract: &Address, slot: &H256) -> Option<MappingSlot> {
        self.entries.get(contract).and_then(|slots| slots.get(slot)).copied()
    }
}

/// Slot of the entry `key` of the mapping at `parent_slot`
pub fn mapping_slot(key: &H256, parent_slot: &H256) -> H256 {
    keccak256([key.as_bytes(), parent_slot.as_bytes()].concat()).into()
}

/// Slot `offset` words after `slot`, wrapping around the slot space
pub fn slot_offset(slot: &H256, offset: u64) -> H256 {
    let (value, _) = U256::from_big_endian(slot.as_bytes()).overflowing_add(U256::from(offset));
    let mut word = H256::zero();
    value.to_big_endian(word.as_bytes_mut());
    word
}
