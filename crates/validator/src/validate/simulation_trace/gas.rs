use crate::{
    error::{Rule, SimulationViolation},
    validate::{SimulationTraceCheck, SimulationTraceHelper},
};
use opguard_primitives::UserOperation;

#[derive(Clone)]
pub struct Gas;

impl SimulationTraceCheck for Gas {
    /// The [check_user_operation] method implementation that checks if the user operation runs out
    /// of gas
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
        // [OP-020] - revert on "out of gas" is forbidden as it can "leak" the gas limit or the
        // current call stack depth
        for (entity, steps) in helper.sub_traces.iter() {
            if let Some(step) = steps.iter().find(|s| s.is_out_of_gas) {
                return Err(helper.policy_violation(Rule::OutOfGas, entity, step.contract, None));
            }
        }

        Ok(())
    }
}
