use super::{args::ValidationArgs, REJECTED_EXIT_CODE};
use crate::fixture::Fixture;
use clap::Parser;
use opguard_validator::{summarize, validate, ValidationOutcome, ValidationResult};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Validate a recorded user operation validation trace
#[derive(Debug, Parser)]
pub struct ValidateCommand {
    /// All validation rules args
    #[clap(flatten)]
    validation: ValidationArgs,

    /// Print the outcome as JSON.
    #[clap(long)]
    json: bool,

    /// Path to the fixture holding the user operation, the trace and the state.
    fixture: PathBuf,
}

impl ValidateCommand {
    /// Loads the fixture and runs the validation rules over its trace.
    pub fn validate(&self) -> eyre::Result<ValidationResult<ValidationOutcome>> {
        let fixture = Fixture::load(&self.fixture)?;
        let entry_point = match self.validation.entry_point {
            Some(addr) => addr,
            None => fixture.entry_point()?,
        };

        info!(
            "Validating user operation from {:?} on entry point {entry_point:?}",
            fixture.user_operation.sender
        );

        Ok(validate(
            &fixture.user_operation,
            &entry_point,
            &fixture.steps,
            &fixture.state(),
            self.validation.val_config(),
        ))
    }

    /// Execute the command
    pub fn execute(self) -> eyre::Result<i32> {
        match self.validate()? {
            Ok(outcome) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&json!({ "valid": outcome }))?);
                } else {
                    println!(
                        "User operation from {:?} is valid ({} calls)",
                        outcome.entities.account,
                        outcome.accesses.len()
                    );
                }
                Ok(0)
            }
            Err(violation) => {
                if self.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({ "rejected": violation }))?
                    );
                } else {
                    println!("User operation rejected: {violation}");
                }
                Ok(REJECTED_EXIT_CODE)
            }
        }
    }
}

/// Print the call-level records derived from a recorded trace
#[derive(Debug, Parser)]
pub struct SummarizeCommand {
    /// Path to the fixture holding the trace.
    fixture: PathBuf,
}

impl SummarizeCommand {
    /// Execute the command
    pub fn execute(self) -> eyre::Result<i32> {
        let fixture = Fixture::load(&self.fixture)?;
        let accesses = summarize(&fixture.steps);
        println!("{}", serde_json::to_string_pretty(&accesses)?);
        Ok(0)
    }
}
