// Setrans: Application Entry Point
//
// Parses CLI arguments, initializes logging on stderr, and dispatches to the
// command handler.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use setrans::cli::{execute, Cli};

fn main() -> ExitCode {
    // RUST_LOG=setrans=debug shows every exchange with the daemon.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("setrans=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match execute(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
