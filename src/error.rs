// Setrans: Top-level error types
//
// Every failed call names the request kind and the label that was
// submitted, so callers can log or display it without extra bookkeeping.

use std::path::PathBuf;

use thiserror::Error;

use crate::wire::{RequestKind, WireError};

/// Top-level error type for all setrans operations.
#[derive(Debug, Error)]
pub enum SetransError {
    #[error("Cannot connect to mcstransd at {}: {source}", path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport error during {kind} of {label:?}: {source}")]
    Transport {
        kind: RequestKind,
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Framing error during {kind} of {label:?}: {source}")]
    Framing {
        kind: RequestKind,
        label: String,
        #[source]
        source: WireError,
    },

    #[error("Invalid security level in {label:?} ({kind})")]
    InvalidLevel { kind: RequestKind, label: String },

    #[error("Initialization error: {0}")]
    Initialization(#[source] WireError),

    #[error("Connection to mcstransd is closed")]
    Closed,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SetransError {
    /// True for failures of the socket itself, the only kind worth a retry.
    pub fn is_transport(&self) -> bool {
        matches!(self, SetransError::Transport { .. })
    }

    /// True when the daemon echoed the label back unchanged.
    pub fn is_invalid_level(&self) -> bool {
        matches!(self, SetransError::InvalidLevel { .. })
    }
}

pub type Result<T> = std::result::Result<T, SetransError>;

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_kind_and_label() {
        let err = SetransError::InvalidLevel {
            kind: RequestKind::TranslatedToRaw,
            label: "staff_u:staff_r:staff_t:FooLow-FooHigh".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("translated-to-raw"));
        assert!(msg.contains("FooLow-FooHigh"));

        let err = SetransError::Framing {
            kind: RequestKind::RawToColor,
            label: "s0".to_string(),
            source: WireError::EmptyResponse,
        };
        assert!(err.to_string().contains("malformed or empty response"));
    }

    #[test]
    fn test_predicates() {
        let transport = SetransError::Transport {
            kind: RequestKind::RawToTranslated,
            label: "s0".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
        };
        assert!(transport.is_transport());
        assert!(!transport.is_invalid_level());

        let level = SetransError::InvalidLevel {
            kind: RequestKind::RawToTranslated,
            label: "s0".to_string(),
        };
        assert!(level.is_invalid_level());
        assert!(!level.is_transport());
        assert!(!SetransError::Closed.is_transport());
    }

    #[test]
    fn test_connection_message_names_socket() {
        let err = SetransError::Connection {
            path: PathBuf::from("/var/run/setrans/.setrans-unix"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/var/run/setrans/.setrans-unix"));
    }
}
