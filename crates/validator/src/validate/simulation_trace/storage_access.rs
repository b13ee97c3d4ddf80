use crate::{
    error::SimulationViolation,
    mapping::resolve_mapping_slot,
    validate::{SimulationTraceCheck, SimulationTraceHelper},
};
use ethers::types::{Address, H256};
use opguard_primitives::{address_to_word, EntityType, TraceStep, UserOperation};
use tracing::trace;

#[derive(Clone)]
pub struct StorageAccess;

impl StorageAccess {
    /// The helper method that checks if the slot is associated with the address.
    ///
    /// A slot is associated with an address if it is the address itself, or the entry of a
    /// mapping (or a field of a struct stored in a mapping) keyed by the address.
    ///
    /// # Arguments
    /// `helper` - The [SimulationTraceHelper] resolving mapping slots
    /// `contract` - The contract owning the storage
    /// `slot` - The slot to check
    /// `addr` - The address to check
    ///
    /// # Returns
    /// true if the slot is associated with the address, otherwise false.
    fn associated_with_slot(
        &self,
        helper: &SimulationTraceHelper,
        contract: &Address,
        slot: &H256,
        addr: &Address,
    ) -> bool {
        if addr.is_zero() {
            return false;
        }

        let word = address_to_word(addr);
        if *slot == word {
            return true;
        }

        resolve_mapping_slot(helper.mappings, contract, slot, helper.val_config.max_struct_offset)
            .is_some_and(|resolved| resolved.key == word)
    }

    /// Whether the storage access of `step` is allowed for the entity whose sub-trace it is in.
    fn is_allowed(
        &self,
        uo: &UserOperation,
        helper: &SimulationTraceHelper,
        step: &TraceStep,
        slot: &H256,
    ) -> bool {
        let contract = step.contract;
        let entities = helper.entities;

        // [STO-010] - Access to the "account" storage is always allowed
        if contract == entities.account {
            return true;
        }

        let is_entity = entities.is_entity(&contract);

        // [STO-021], [STO-022] - Access to associated storage of the account in an external
        // (non-entity contract) is allowed if either the account already exists or there is an
        // initCode and the factory contract is staked
        if !is_entity &&
            self.associated_with_slot(helper, &contract, slot, &entities.account) &&
            (!uo.has_init_code() || entities.factory.is_staked)
        {
            return true;
        }

        let mut staked = entities.staked().peekable();
        if staked.peek().is_none() {
            return false;
        }

        for entity in staked {
            // [STO-031] - access the entity's own storage (if entity staked)
            if entity.address == contract {
                return true;
            }

            // [STO-032] - read/write access to storage slots that are associated with the entity,
            // in any non-entity contract (if entity staked)
            if !is_entity && self.associated_with_slot(helper, &contract, slot, &entity.address) {
                return true;
            }
        }

        // [STO-033] - read-only access to any storage in non-entity contract (if entity staked)
        !is_entity && !step.opcode.is_storage_write()
    }

    /// Value written by `step`, or on a read the value the following step at the same depth
    /// finds on top of the stack
    fn accessed_value(step: &TraceStep, next: Option<&&TraceStep>) -> H256 {
        if step.opcode.is_storage_write() {
            return step.peek_word(1);
        }

        match next {
            Some(next) if next.depth == step.depth => next.peek_word(0),
            _ => H256::zero(),
        }
    }

    fn check_steps(
        &self,
        uo: &UserOperation,
        helper: &SimulationTraceHelper,
        entity: EntityType,
        steps: &[&TraceStep],
    ) -> Result<(), SimulationViolation> {
        for (i, step) in steps.iter().enumerate() {
            if !step.opcode.is_storage_access() {
                continue;
            }

            let slot = step.peek_word(0);
            if self.is_allowed(uo, helper, step, &slot) {
                trace!("{entity} accessed slot {slot:?} of {:?}", step.contract);
                continue;
            }

            return Err(SimulationViolation::InvalidStorageLocation {
                entity,
                contract: step.contract,
                label: helper.label(&step.contract),
                slot,
                value: Self::accessed_value(step, steps.get(i + 1)),
                is_write: step.opcode.is_storage_write(),
            });
        }

        Ok(())
    }
}

impl SimulationTraceCheck for StorageAccess {
    /// The method implementation that checks if the user operation access
    /// storage other than the one associated with itself.
    ///
    /// # Arguments
    /// `uo` - The [UserOperation](UserOperation) to check
    /// `helper` - The [SimulationTraceHelper](crate::validate::SimulationTraceHelper)
    ///
    /// # Returns
    /// None if the check passes, otherwise a [SimulationViolation] error.
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        helper: &SimulationTraceHelper,
    ) -> Result<(), SimulationViolation> {
        for (entity, steps) in helper.sub_traces.iter() {
            self.check_steps(uo, helper, entity, steps)?;
        }

        Ok(())
    }
}
