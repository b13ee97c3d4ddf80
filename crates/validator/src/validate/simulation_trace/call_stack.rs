use crate::{
    error::{Rule, SimulationViolation},
    validate::{SimulationTraceCheck, SimulationTraceHelper},
};
use opguard_primitives::{
    constants::entry_point::DEPOSIT_TO_SELECTOR, Opcode, TraceStep, UserOperation,
};

#[derive(Clone)]
pub struct CallStack;

impl CallStack {
    /// Whether the entry point call made by `step` is one entities may make.
    ///
    /// # Arguments
    /// `helper` - The [SimulationTraceHelper]
    /// `step` - The call instruction targeting the entry point
    ///
    /// # Returns
    /// true for the fallback function called by the account and for `depositTo` called by the
    /// account or the factory.
    fn is_allowed_entry_point_call(
        &self,
        helper: &SimulationTraceHelper,
        step: &TraceStep,
    ) -> bool {
        let from_account = step.contract == helper.entities.account;
        let from_factory = helper.entities.factory.is(&step.contract);
        let input = step.memory_input.as_ref();

        (input.is_empty() && from_account) ||
            (input.starts_with(&DEPOSIT_TO_SELECTOR) && (from_account || from_factory))
    }
}

impl SimulationTraceCheck for CallStack {
    /// The method implementation that performs the call stack trace check.
    ///
    /// # Arguments
    /// `_uo` - Not used in this check
    /// `helper` - The [SimulationTraceHelper](crate::validate::SimulationTraceHelper)
    ///
    /// # Returns
    /// None if the check passes, otherwise a [SimulationViolation] error.
    fn check_user_operation(
        &self,
        _uo: &UserOperation,
        helper: &SimulationTraceHelper,
    ) -> Result<(), SimulationViolation> {
        let entities = helper.entities;

        for (entity, steps) in helper.sub_traces.iter() {
            for step in steps.iter().filter(|s| s.opcode.is_call()) {
                let target = step.peek_address(1);

                // [OP-061] - CALL with value is forbidden. The only exception is a call to the
                // EntryPoint from the account or the factory
                if matches!(step.opcode, Opcode::CALL | Opcode::CALLCODE) {
                    let value = step.peek(2).unwrap_or_default();
                    let from_account_or_factory = step.contract == entities.account ||
                        entities.factory.is(&step.contract);

                    if !value.is_zero() &&
                        !(from_account_or_factory && target == helper.entry_point)
                    {
                        return Err(helper.policy_violation(
                            Rule::CallWithValue,
                            entity,
                            step.contract,
                            Some(target),
                        ));
                    }
                }

                // [OP-052] - may call depositTo(sender) with any value from either the sender or
                // factory
                // [OP-053] - may call the fallback function from the sender with any value
                // [OP-054] - any other access to the EntryPoint is forbidden
                if target == helper.entry_point && !self.is_allowed_entry_point_call(helper, step)
                {
                    return Err(helper.policy_violation(
                        Rule::EntryPointCall,
                        entity,
                        step.contract,
                        Some(target),
                    ));
                }
            }
        }

        Ok(())
    }
}
