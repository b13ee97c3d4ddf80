use crate::{
    error::{Rule, SimulationViolation},
    validate::{SimulationTraceCheck, SimulationTraceHelper},
};
use ethers::utils::get_create2_address;
use opguard_primitives::{simulation::FORBIDDEN_OPCODES, Opcode, UserOperation};
use tracing::trace;

#[derive(Clone)]
pub struct Opcodes;

impl SimulationTraceCheck for Opcodes {
    /// The method implementation that checks the use of forbidden opcodes and of CREATE2
    ///
    /// # Arguments
    /// `uo` - The user operation to check
    /// `helper` - The [SimulationTraceHelper]
    ///
    /// # Returns
    /// None if the check passes, otherwise a [SimulationViolation] error.
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        helper: &SimulationTraceHelper,
    ) -> Result<(), SimulationViolation> {
        let mut create2_count = 0usize;

        for (entity, steps) in helper.sub_traces.iter() {
            for (i, step) in steps.iter().enumerate() {
                // [OP-031] - CREATE2 is allowed exactly once in the deployment phase and must
                // deploy code for the "sender" address
                if step.opcode == Opcode::CREATE2 {
                    create2_count += 1;
                    let created = get_create2_address(
                        step.contract,
                        step.peek_word(3).to_fixed_bytes(),
                        &step.memory_input,
                    );
                    trace!("CREATE2 #{create2_count} by {:?} deploys {created:?}", step.contract);

                    if !uo.has_init_code() || create2_count > 1 || created != uo.sender {
                        return Err(helper.policy_violation(
                            Rule::Create2,
                            entity,
                            step.contract,
                            Some(created),
                        ));
                    }
                    continue;
                }

                // [OP-011] - block opcodes
                if !FORBIDDEN_OPCODES.contains(&step.opcode) {
                    continue;
                }

                match step.opcode {
                    // [OP-012] - GAS is allowed if followed immediately by a call instruction
                    Opcode::GAS => {
                        if steps.get(i + 1).is_some_and(|next| next.opcode.is_call()) {
                            continue;
                        }
                        return Err(helper.opcode_violation(
                            Rule::GasNotFollowedByCall,
                            entity,
                            step,
                        ));
                    }
                    // [OP-080] - BALANCE and SELFBALANCE are allowed for staked entities
                    Opcode::BALANCE | Opcode::SELFBALANCE => {
                        if helper.entities.is_staked(&step.contract) {
                            continue;
                        }
                        return Err(helper.opcode_violation(Rule::UnstakedBalance, entity, step));
                    }
                    _ => return Err(helper.opcode_violation(Rule::ForbiddenOpcode, entity, step)),
                }
            }
        }

        Ok(())
    }
}
