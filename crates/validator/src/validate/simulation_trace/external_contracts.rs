use crate::{
    error::{Rule, SimulationViolation},
    validate::{SimulationTraceCheck, SimulationTraceHelper},
};
use ethers::types::Address;
use opguard_primitives::{simulation::is_precompile, TraceStep, UserOperation};

#[derive(Clone)]
pub struct ExternalContracts;

impl ExternalContracts {
    /// Address a call or EXTCODE* instruction accesses, `None` for other instructions.
    fn accessed_address(step: &TraceStep) -> Option<Address> {
        if step.opcode.is_call() {
            Some(step.peek_address(1))
        } else if step.opcode.is_ext_code_access() {
            Some(step.peek_address(0))
        } else {
            None
        }
    }
}

impl SimulationTraceCheck for ExternalContracts {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        helper: &SimulationTraceHelper,
    ) -> Result<(), SimulationViolation> {
        for (entity, steps) in helper.sub_traces.iter() {
            for step in steps.iter() {
                let Some(target) = Self::accessed_address(step) else {
                    continue;
                };

                // [OP-041] - access to an address without a deployed code is forbidden for EXTCODE*
                // and *CALL opcodes
                // [OP-042] - exception: access to "sender" address is allowed
                if target == uo.sender || is_precompile(&target) || helper.code.has_code(&target) {
                    continue;
                }

                return Err(helper.policy_violation(
                    Rule::CallWithoutCode,
                    entity,
                    step.contract,
                    Some(target),
                ));
            }
        }

        Ok(())
    }
}
