//! User operation validator module provides the composable rule checks run over a validation
//! trace and the validator assembling them.
use crate::{
    entities::Entities,
    error::{Rule, SimulationViolation},
    filter::SubTraces,
    state::{AddressLabeler, CodeProvider, MappingRecorder},
};
use ethers::types::Address;
use opguard_primitives::{AccountAccess, EntityType, TraceStep, UserOperation, ValidationConfig};
use serde::{Deserialize, Serialize};

pub mod simulation_trace;
pub mod validator;

/// The outcome of a successful user operation validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub entities: Entities,
    /// Call-level records of every frame opened during validation
    pub accesses: Vec<AccountAccess>,
}

/// The [UserOperation] simulation trace check helper.
pub struct SimulationTraceHelper<'a> {
    pub entry_point: Address,
    pub entities: &'a Entities,
    pub sub_traces: &'a SubTraces<'a>,
    pub code: &'a dyn CodeProvider,
    pub mappings: &'a dyn MappingRecorder,
    pub labels: &'a dyn AddressLabeler,
    pub val_config: &'a ValidationConfig,
}

impl<'a> SimulationTraceHelper<'a> {
    /// Name of `address` for reports: the labeler's name, else the entity role, else the hex
    /// address.
    pub fn label(&self, address: &Address) -> String {
        if let Some(label) = self.labels.label(address) {
            return label;
        }

        match self.entities.entity_type(address) {
            Some(entity) => entity.as_str().to_string(),
            None => format!("{address:?}"),
        }
    }

    pub fn policy_violation(
        &self,
        rule: Rule,
        entity: EntityType,
        contract: Address,
        target: Option<Address>,
    ) -> SimulationViolation {
        SimulationViolation::Policy {
            rule,
            entity,
            contract,
            label: self.label(&contract),
            target,
        }
    }

    pub fn opcode_violation(
        &self,
        rule: Rule,
        entity: EntityType,
        step: &TraceStep,
    ) -> SimulationViolation {
        SimulationViolation::InvalidOpcode {
            entity,
            contract: step.contract,
            label: self.label(&step.contract),
            opcode: step.opcode,
            rule,
        }
    }
}

pub trait SimulationTraceCheck: Send + Sync {
    /// Checks the sub-traces of a user operation against one group of validation rules.
    ///
    /// # Arguments
    /// `uo` - The user operation being validated
    /// `helper` - The [SimulationTraceHelper] holding the entities, the sub-traces and the state
    /// the trace was recorded against
    ///
    /// # Returns
    /// `Ok(())` if every step passes, otherwise the first [SimulationViolation] in scan order.
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        helper: &SimulationTraceHelper,
    ) -> Result<(), SimulationViolation>;
}

macro_rules! simulation_trace_check_impls {
    ( $( $name:ident )+ ) => {
        #[allow(non_snake_case)]
        impl<$($name : SimulationTraceCheck,)+> SimulationTraceCheck for ($($name,)+)
        {
            fn check_user_operation(
                &self,
                uo: &UserOperation,
                helper: &SimulationTraceHelper,
            ) -> Result<(), SimulationViolation>
                {
                    let ($($name,)+) = self;
                    ($($name.check_user_operation(uo, helper)?,)+);
                    Ok(())
                }
        }
    };
}

impl SimulationTraceCheck for () {
    fn check_user_operation(
        &self,
        _uo: &UserOperation,
        _helper: &SimulationTraceHelper,
    ) -> Result<(), SimulationViolation> {
        Ok(())
    }
}

// These macro enable people to chain simulation trace check implementations:
// `(SimulationTraceCheck1, SimulationTraceCheck2, ...).check_user_operation(uo, helper)`
// SimulationTraceCheck1,2 could be any data type which implement SimulationTraceCheck trait.
simulation_trace_check_impls! { A }
simulation_trace_check_impls! { A B }
simulation_trace_check_impls! { A B C }
simulation_trace_check_impls! { A B C D }
simulation_trace_check_impls! { A B C D F }
simulation_trace_check_impls! { A B C D F G }
simulation_trace_check_impls! { A B C D F G I }
simulation_trace_check_impls! { A B C D F G I J }
