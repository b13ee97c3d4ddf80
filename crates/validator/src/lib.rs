//! Account abstraction (ERC-4337) validation rules engine.
//!
//! Classifies the recorded trace of a user operation's validation call against the storage,
//! call, creation and opcode rules a bundler enforces
//! ([ERC-7562](https://github.com/eth-infinitism/account-abstraction/blob/develop/erc/ERCS/erc-7562.md)).
//! The engine does not execute anything, the trace and the state it was recorded against are
//! provided by the caller through the traits in [state].

mod entities;
pub mod error;
mod filter;
pub mod mapping;
mod memory;
pub mod state;
mod summary;
pub mod validate;

pub use entities::{Entities, EntityInfo};
pub use error::{Rule, SimulationViolation, ValidationResult};
pub use filter::SubTraces;
pub use memory::MemoryState;
pub use state::{AddressLabeler, CodeProvider, MappingRecorder, MappingSlot, StakeRegistry};
pub use summary::summarize;
pub use validate::{
    validator::{new_canonical, validate, StandardUserOperationValidator, StandardValidator},
    SimulationTraceCheck, SimulationTraceHelper, ValidationOutcome,
};
