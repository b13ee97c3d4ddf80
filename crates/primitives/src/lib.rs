//! Account abstraction (ERC-4337) validation primitive types
//!
//! This crate contains the types shared by the opguard validation engine: the user operation,
//! stake information of entities, the recorded execution trace (instruction steps and call-level
//! access records) and helper functions.

pub mod constants;
pub mod simulation;
pub mod stake;
mod user_operation;
mod utils;

pub use simulation::{
    AccountAccess, CallKind, Opcode, StorageAccess, TraceStep, UnknownOpcode, ValidationConfig,
};
pub use stake::{EntityType, StakeInfo};
pub use user_operation::UserOperation;
pub use utils::{address_to_word, get_address, word_to_address};
