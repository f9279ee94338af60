use std::io;
use std::process::ExitCode;

use clap::Parser;
use snapfix::cli::{Cli, Commands};
use snapfix::error::SnapfixError;

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::debug!(%error, "apply failed");
            let serialized = serde_json::to_string_pretty(&error.to_error_response()).unwrap_or_else(
                |_| {
                    "{\"error\":{\"type\":\"serialization_error\",\"message\":\"Failed to serialize error response\"}}"
                        .to_string()
                },
            );
            println!("{serialized}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<String, SnapfixError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply(args) => {
            let response = snapfix::cli::apply::run_apply(args)?;
            serde_json::to_string_pretty(&response)
                .map_err(|source| SnapfixError::ResponseSerialization { source })
        }
    }
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
