//! Call-level view of a validation trace.

use ethers::types::{Address, H256, U256};
use opguard_primitives::{AccountAccess, CallKind, StorageAccess, TraceStep};
use std::collections::HashMap;

/// Derives one [AccountAccess] per frame opened in `steps`, in the order the frames were opened.
///
/// Storage accesses are attached to the innermost open frame. Accesses made before any frame is
/// opened (by the traced call itself) are not reported. A write's previous value is the last
/// value seen for the slot in the trace, zero if the slot was not touched before.
pub fn summarize(steps: &[TraceStep]) -> Vec<AccountAccess> {
    let mut accesses: Vec<AccountAccess> = vec![];
    // (depth of the frame's own steps, index in `accesses`)
    let mut frames: Vec<(u64, usize)> = vec![];
    let mut known: HashMap<(Address, H256), H256> = HashMap::new();

    for (i, step) in steps.iter().enumerate() {
        while frames.last().is_some_and(|(depth, _)| *depth > step.depth) {
            frames.pop();
        }

        let current = frames.last().filter(|(depth, _)| *depth == step.depth).map(|(_, idx)| *idx);

        if let Some(idx) = current {
            let access = &mut accesses[idx];
            if access.kind == CallKind::Create && access.account.is_zero() {
                access.account = step.contract;
            }
        }

        if step.opcode.is_storage_access() {
            let slot = step.peek_word(0);
            let previous = known.get(&(step.contract, slot)).copied().unwrap_or_default();

            let storage_access = if step.opcode.is_storage_write() {
                StorageAccess {
                    account: step.contract,
                    slot,
                    previous_value: previous,
                    new_value: step.peek_word(1),
                    is_write: true,
                }
            } else {
                let value = steps
                    .get(i + 1)
                    .filter(|next| next.depth == step.depth)
                    .map(|next| next.peek_word(0))
                    .unwrap_or(previous);
                StorageAccess {
                    account: step.contract,
                    slot,
                    previous_value: value,
                    new_value: value,
                    is_write: false,
                }
            };
            known.insert((step.contract, slot), storage_access.new_value);

            if let Some(idx) = current {
                accesses[idx].storage_accesses.push(storage_access);
            }
            continue;
        }

        let Some(kind) = CallKind::from_opcode(step.opcode) else {
            continue;
        };

        let (account, value) = match kind {
            CallKind::Create => (Address::zero(), step.peek(0).unwrap_or_default()),
            CallKind::Call | CallKind::CallCode => {
                (step.peek_address(1), step.peek(2).unwrap_or_default())
            }
            CallKind::DelegateCall | CallKind::StaticCall => (step.peek_address(1), U256::zero()),
        };

        frames.push((step.depth + 1, accesses.len()));
        accesses.push(AccountAccess {
            account,
            accessor: step.contract,
            kind,
            value,
            data: step.memory_input.clone(),
            depth: step.depth,
            storage_accesses: vec![],
        });
    }

    accesses
}
