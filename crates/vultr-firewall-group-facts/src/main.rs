//! Gather facts about the firewall groups available in a Vultr account.
//!
//! Reads module parameters as JSON from the arguments file given on the
//! command line, or from standard input, and writes one JSON result document
//! to standard output. Logs go to standard error.

use anyhow::Context;
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn, Level};
use vultr_core::{Error, FailureResult};

mod module;

/// Gather facts about Vultr firewall groups.
#[derive(Parser)]
#[command(name = "vultr_firewall_group_facts", version, about)]
struct Cli {
    /// Path to the JSON arguments file (reads standard input when omitted).
    args_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match read_input(&cli) {
        Ok(input) => module::run(&input).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(result) => {
            println!("{}", result.to_json());
            ExitCode::SUCCESS
        }
        Err(err) => {
            log_failure(&err);
            println!("{}", FailureResult::new(format!("{err:#}")).to_json());
            ExitCode::FAILURE
        }
    }
}

/// Setup problems are errors. Failures caused by the API's answer are
/// warnings, since the result document already carries them.
fn failure_level(err: &anyhow::Error) -> Level {
    match err.downcast_ref::<Error>() {
        Some(vultr) if !vultr.should_log() => Level::WARN,
        _ => Level::ERROR,
    }
}

fn log_failure(err: &anyhow::Error) {
    let code = err
        .downcast_ref::<Error>()
        .map_or("MODULE_ERROR", Error::error_code);

    if failure_level(err) == Level::ERROR {
        error!(code, "{err:#}");
    } else {
        warn!(code, "{err:#}");
    }
}

fn read_input(cli: &Cli) -> anyhow::Result<String> {
    match &cli.args_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read arguments file {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read arguments from standard input")?;
            Ok(input)
        }
    }
}
