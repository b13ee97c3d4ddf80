//! Splitting the flat validation trace into the parts executed on behalf of each entity.

use crate::entities::Entities;
use ethers::types::Address;
use opguard_primitives::{EntityType, Opcode, TraceStep};
use tracing::debug;

/// Steps executed on behalf of each entity, in execution order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubTraces<'a> {
    pub factory: Vec<&'a TraceStep>,
    pub account: Vec<&'a TraceStep>,
    pub paymaster: Vec<&'a TraceStep>,
}

impl<'a> SubTraces<'a> {
    /// Splits `steps` by the entity the entry point called into.
    ///
    /// The entry point's own frame is the one at the depth where its address is first seen.
    /// Steps of that frame are dropped, but every CALL or STATICCALL in it selects the entity the
    /// deeper steps that follow are attributed to. Deeper steps under a call to any other address
    /// are dropped, except calls to `sender_creator` which run the factory.
    pub fn split(
        steps: &'a [TraceStep],
        entities: &Entities,
        entry_point: &Address,
        sender_creator: Option<Address>,
    ) -> Self {
        let mut sub_traces = Self::default();

        let Some(start_depth) = steps.iter().find(|s| s.contract == *entry_point).map(|s| s.depth)
        else {
            debug!("Entry point {entry_point:?} not found in trace, nothing to validate");
            return sub_traces;
        };

        let mut current_target = Address::zero();

        for step in steps {
            if step.depth == start_depth && step.contract == *entry_point {
                if matches!(step.opcode, Opcode::CALL | Opcode::STATICCALL) {
                    current_target = step.peek_address(1);
                }
                continue;
            }

            if step.depth <= start_depth || current_target.is_zero() {
                continue;
            }

            if current_target == entities.account {
                sub_traces.account.push(step);
            } else if entities.paymaster.is(&current_target) {
                sub_traces.paymaster.push(step);
            } else if entities.factory.is(&current_target) ||
                sender_creator.is_some_and(|c| !c.is_zero() && c == current_target)
            {
                sub_traces.factory.push(step);
            }
        }

        debug!(
            "Split trace of {} steps: factory {}, account {}, paymaster {}",
            steps.len(),
            sub_traces.factory.len(),
            sub_traces.account.len(),
            sub_traces.paymaster.len()
        );

        sub_traces
    }

    /// Sub-traces in the order their validation phases run
    pub fn iter(&self) -> impl Iterator<Item = (EntityType, &[&'a TraceStep])> {
        [
            (EntityType::Factory, self.factory.as_slice()),
            (EntityType::Account, self.account.as_slice()),
            (EntityType::Paymaster, self.paymaster.as_slice()),
        ]
        .into_iter()
    }

    pub fn len(&self) -> usize {
        self.factory.len() + self.account.len() + self.paymaster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
