use ethers::types::{Address, H256};
use opguard_primitives::{EntityType, Opcode};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumMessage;
use strum_macros::{EnumMessage, IntoStaticStr};
use thiserror::Error;

pub type ValidationResult<T> = Result<T, SimulationViolation>;

/// Validation rules with a fixed identifier
/// https://github.com/eth-infinitism/account-abstraction/blob/develop/erc/ERCS/erc-7562.md
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, IntoStaticStr, EnumMessage, Serialize, Deserialize,
)]
pub enum Rule {
    #[strum(serialize = "OP-011", message = "opcode is banned during validation")]
    ForbiddenOpcode,
    #[strum(serialize = "OP-012", message = "GAS opcode must be immediately followed by a call")]
    GasNotFollowedByCall,
    #[strum(serialize = "OP-020", message = "validation must not revert on out of gas")]
    OutOfGas,
    #[strum(
        serialize = "OP-031",
        message = "CREATE2 is allowed exactly once in the deployment phase and must deploy the sender"
    )]
    Create2,
    #[strum(serialize = "OP-041", message = "cannot call addresses without code")]
    CallWithoutCode,
    #[strum(
        serialize = "OP-052",
        message = "only the entry point fallback (from the account) and depositTo may be called"
    )]
    EntryPointCall,
    #[strum(
        serialize = "OP-061",
        message = "value may only be sent from the account or factory to the entry point"
    )]
    CallWithValue,
    #[strum(
        serialize = "OP-080",
        message = "BALANCE and SELFBALANCE are only allowed for staked entities"
    )]
    UnstakedBalance,
}

impl Rule {
    pub fn code(&self) -> &'static str {
        self.into()
    }

    pub fn description(&self) -> &'static str {
        self.get_message().unwrap_or_default()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.description())
    }
}

/// Reason a user operation failed the validation rules
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationViolation {
    /// Storage access none of the ownership, association or staking rules allow
    #[error(
        "{entity} accessed forbidden storage of {label} ({contract:?}) at slot {slot:?} (value {value:?}, write: {is_write})"
    )]
    InvalidStorageLocation {
        entity: EntityType,
        contract: Address,
        label: String,
        slot: H256,
        /// Value being written, or the current value on a read
        value: H256,
        is_write: bool,
    },
    /// Banned opcode, or an opcode used outside of its exception
    #[error("{entity} uses banned opcode {opcode} in {label} ({contract:?}): {rule}")]
    InvalidOpcode {
        entity: EntityType,
        contract: Address,
        label: String,
        opcode: Opcode,
        rule: Rule,
    },
    /// Call, creation or gas rule violation
    #[error("{entity} violated {rule} in {label} ({contract:?}){}", target_suffix(.target))]
    Policy {
        rule: Rule,
        entity: EntityType,
        contract: Address,
        label: String,
        /// Callee, created contract or accessed address, if the rule concerns one
        target: Option<Address>,
    },
}

fn target_suffix(target: &Option<Address>) -> String {
    target.map(|t| format!(", target {t:?}")).unwrap_or_default()
}

impl SimulationViolation {
    /// The rule identifier of call, creation, gas and opcode violations
    pub fn rule(&self) -> Option<Rule> {
        match self {
            SimulationViolation::InvalidStorageLocation { .. } => None,
            SimulationViolation::InvalidOpcode { rule, .. } |
            SimulationViolation::Policy { rule, .. } => Some(*rule),
        }
    }

    /// Entity whose validation phase produced the violation
    pub fn entity(&self) -> EntityType {
        match self {
            SimulationViolation::InvalidStorageLocation { entity, .. } |
            SimulationViolation::InvalidOpcode { entity, .. } |
            SimulationViolation::Policy { entity, .. } => *entity,
        }
    }
}
