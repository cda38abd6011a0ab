// Setrans: CLI Command Handler
//
// Every subcommand sends its labels through one client handle, so a whole
// invocation shares a single daemon connection. A failed label is reported
// and the remaining labels are still processed.

use std::time::Duration;

use serde::Serialize;

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::SetransError;
use crate::wire::RequestKind;

use super::Cli;

/// One translated label, as printed by `--json`.
#[derive(Debug, Serialize)]
struct Translation<'a> {
    request: &'a str,
    input: &'a str,
    output: &'a str,
}

/// Execute the parsed CLI command. Returns `Ok(false)` if any label failed.
pub fn execute(cli: Cli) -> Result<bool, SetransError> {
    let config = build_config(&cli)?;
    let client = Client::with_config(config)?;
    let kind = cli.command.kind();

    let mut all_ok = true;
    for label in cli.command.labels() {
        match client.translate(kind, label) {
            Ok(output) => println!("{}", render(cli.json, kind, label, &output)),
            Err(e) => {
                eprintln!("Error: {}", e);
                all_ok = false;
            }
        }
    }

    client.close()?;
    Ok(all_ok)
}

/// Environment defaults, then command-line flags on top.
fn build_config(cli: &Cli) -> Result<ClientConfig, SetransError> {
    let mut config = ClientConfig::from_env()?;

    if let Some(ref socket) = cli.socket {
        config = config.with_socket_path(socket);
    }
    match cli.connect_timeout_ms {
        Some(0) => {
            return Err(SetransError::Config(
                "--connect-timeout-ms must be greater than zero".to_string(),
            ))
        }
        Some(ms) => config = config.with_connect_timeout(Duration::from_millis(ms)),
        None => {}
    }

    Ok(config)
}

fn render(json: bool, kind: RequestKind, input: &str, output: &str) -> String {
    if !json {
        return output.to_string();
    }
    let record = Translation {
        request: kind.as_str(),
        input,
        output,
    };
    serde_json::to_string(&record).unwrap_or_default()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
