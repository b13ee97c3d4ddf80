use super::{
    simulation_trace::{
        call_stack::CallStack, external_contracts::ExternalContracts, gas::Gas, opcodes::Opcodes,
        storage_access::StorageAccess,
    },
    SimulationTraceCheck, SimulationTraceHelper, ValidationOutcome,
};
use crate::{
    entities::Entities,
    error::ValidationResult,
    filter::SubTraces,
    mapping::TraceMappingRecorder,
    state::{AddressLabeler, CodeProvider, MappingRecorder, StakeRegistry},
    summary::summarize,
};
use ethers::types::Address;
use opguard_primitives::{TraceStep, UserOperation, ValidationConfig};
use tracing::{debug, info};

pub type StandardValidator = StandardUserOperationValidator<(
    Gas,
    Opcodes,
    ExternalContracts,
    StorageAccess,
    CallStack,
)>;

/// Standard implementation of the validation rules engine.
#[derive(Clone)]
pub struct StandardUserOperationValidator<SimTrCk>
where
    SimTrCk: SimulationTraceCheck,
{
    /// An array of [SimulationTraceChecks](SimulationTraceCheck).
    simulation_trace_checks: SimTrCk,
    /// Settings of every validation pass.
    val_config: ValidationConfig,
}

/// Creates a new [StandardUserOperationValidator] with the simulation trace checks of the
/// canonical mempool.
///
/// # Arguments
/// `val_config` - stake minimums, struct offset bound and sender creator used in every pass
///
/// # Returns
/// A new [StandardUserOperationValidator].
pub fn new_canonical(val_config: ValidationConfig) -> StandardValidator {
    StandardUserOperationValidator::new(
        (Gas, Opcodes, ExternalContracts, StorageAccess, CallStack),
        val_config,
    )
}

impl<SimTrCk> StandardUserOperationValidator<SimTrCk>
where
    SimTrCk: SimulationTraceCheck,
{
    pub fn new(simulation_trace_checks: SimTrCk, val_config: ValidationConfig) -> Self {
        Self { simulation_trace_checks, val_config }
    }

    pub fn val_config(&self) -> &ValidationConfig {
        &self.val_config
    }

    /// Validates the recorded trace of the validation call of a [UserOperation].
    ///
    /// # Arguments
    /// `uo` - The [UserOperation] whose validation call was traced
    /// `entry_point` - Address of the entry point orchestrating the validation call
    /// `trace` - Steps of the validation call in execution order
    /// `state` - Stakes, deployed code, mapping entries and labels the trace was recorded against
    ///
    /// # Returns
    /// The resolved entities and the call-level records of the trace, or the first
    /// [SimulationViolation](crate::error::SimulationViolation) found.
    pub fn validate_user_operation<S>(
        &self,
        uo: &UserOperation,
        entry_point: &Address,
        trace: &[TraceStep],
        state: &S,
    ) -> ValidationResult<ValidationOutcome>
    where
        S: StakeRegistry + CodeProvider + MappingRecorder + AddressLabeler,
    {
        debug!("Validating user operation from {:?} ({} trace steps)", uo.sender, trace.len());

        let entities = Entities::resolve(uo, entry_point, state, &self.val_config);

        let learned = TraceMappingRecorder::from_steps(trace);
        debug!("Learned {} mapping entries from the trace", learned.len());
        let mappings = (state, &learned);

        let sub_traces =
            SubTraces::split(trace, &entities, entry_point, self.val_config.sender_creator);

        let helper = SimulationTraceHelper {
            entry_point: *entry_point,
            entities: &entities,
            sub_traces: &sub_traces,
            code: state,
            mappings: &mappings,
            labels: state,
            val_config: &self.val_config,
        };

        if let Err(err) = self.simulation_trace_checks.check_user_operation(uo, &helper) {
            info!("User operation from {:?} rejected: {err}", uo.sender);
            return Err(err);
        }

        Ok(ValidationOutcome { entities, accesses: summarize(trace) })
    }
}

/// Validates `trace` with the canonical rule set.
pub fn validate<S>(
    uo: &UserOperation,
    entry_point: &Address,
    trace: &[TraceStep],
    state: &S,
    val_config: ValidationConfig,
) -> ValidationResult<ValidationOutcome>
where
    S: StakeRegistry + CodeProvider + MappingRecorder + AddressLabeler,
{
    new_canonical(val_config).validate_user_operation(uo, entry_point, trace, state)
}
