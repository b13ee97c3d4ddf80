use clap::{value_parser, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod commands;

/// Exit code of a user operation that violates a validation rule
pub const REJECTED_EXIT_CODE: i32 = 2;

/// The main opguard CLI interface
#[derive(Debug, Parser)]
#[command(author, version, about = "opguard", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,

    /// The verbosity level
    #[clap(long, short, global = true, default_value_t = 2, value_parser = value_parser!(u8).range(..=4))]
    verbosity: u8,
}

impl Cli {
    /// Get the log level based on the verbosity level
    pub fn get_log_level(&self) -> String {
        match self.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
        .into()
    }
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a recorded user operation validation trace
    #[command(name = "validate")]
    Validate(commands::ValidateCommand),

    /// Print the call-level records derived from a recorded trace
    #[command(name = "summarize")]
    Summarize(commands::SummarizeCommand),
}

/// Runs the CLI, returns the process exit code.
pub fn run() -> eyre::Result<i32> {
    let cli = Cli::parse();

    let level = cli.get_log_level();
    let rust_log = match std::env::var("RUST_LOG") {
        Ok(val) => format!("{val},opguard={level},opguard_validator={level}"),
        Err(_) => format!("opguard={level},opguard_validator={level}"),
    };
    std::env::set_var("RUST_LOG", rust_log);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate(command) => command.execute(),
        Commands::Summarize(command) => command.execute(),
    }
}
