//! # pac-validate entry point
//!
//! Parses arguments, initializes logging, and maps the validation result
//! to the process exit code.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pac_cli::config::RunnerConfig;
use pac_cli::runner::{exit_code, run_validation, ValidateArgs};

/// Validate the OpenAPI specification, schema definitions, and plugin
/// manifest of a Power Automate connector.
#[derive(Parser, Debug)]
#[command(name = "pac-validate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    args: ValidateArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("pac-validate v{} starting", env!("CARGO_PKG_VERSION"));

    let result = RunnerConfig::from_args(&cli.args).and_then(|config| run_validation(&config));

    ExitCode::from(exit_code(result))
}
