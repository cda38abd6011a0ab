// Setrans: CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: raw-to-trans, trans-to-raw, raw-to-color.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::wire::RequestKind;

pub use commands::execute;

/// Translate security contexts through the mcstransd daemon.
#[derive(Parser, Debug)]
#[command(name = "setrans")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path of the mcstransd socket. Defaults to $SETRANS_SOCKET, then the
    /// well-known system socket.
    #[arg(long, global = true)]
    pub socket: Option<PathBuf>,

    /// How long to wait for the daemon to accept the connection.
    #[arg(long, global = true)]
    pub connect_timeout_ms: Option<u64>,

    /// Print one JSON object per label instead of plain text.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate raw contexts into their human-readable form.
    RawToTrans {
        /// One or more raw contexts (e.g., "staff_u:staff_r:staff_t:s0-s15:c0.c1023").
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Translate human-readable contexts back into raw form.
    TransToRaw {
        /// One or more translated contexts (e.g., "staff_u:staff_r:staff_t:SystemLow-SystemHigh").
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Look up the display colors of raw contexts.
    RawToColor {
        /// One or more raw contexts.
        #[arg(required = true)]
        labels: Vec<String>,
    },
}

impl Commands {
    pub fn kind(&self) -> RequestKind {
        match self {
            Commands::RawToTrans { .. } => RequestKind::RawToTranslated,
            Commands::TransToRaw { .. } => RequestKind::TranslatedToRaw,
            Commands::RawToColor { .. } => RequestKind::RawToColor,
        }
    }

    pub fn labels(&self) -> &[String] {
        match self {
            Commands::RawToTrans { labels }
            | Commands::TransToRaw { labels }
            | Commands::RawToColor { labels } => labels,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
