// Setrans: Client Configuration
//
// Where the daemon listens and how long to wait for it at connect time.
// Both are fixed for the lifetime of a client handle.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SetransError};

/// Well-known mcstransd socket.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/setrans/.setrans-unix";

/// The daemon is local, so a short dial timeout is plenty.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Environment variable overriding the socket path.
pub const SOCKET_ENV: &str = "SETRANS_SOCKET";

/// Environment variable overriding the connect timeout, in milliseconds.
pub const CONNECT_TIMEOUT_ENV: &str = "SETRANS_CONNECT_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub socket_path: PathBuf,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults, overridden by `SETRANS_SOCKET` and `SETRANS_CONNECT_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(SOCKET_ENV).filter(|p| !p.trim().is_empty()) {
            config.socket_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout = parse_timeout_ms(&raw)?;
        }

        Ok(config)
    }

    pub fn with_socket_path(mut self, path: impl AsRef<Path>) -> Self {
        self.socket_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Parse a strictly positive millisecond count.
pub fn parse_timeout_ms(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(SetransError::Config(format!(
            "{} must be a positive number of milliseconds, got {:?}",
            CONNECT_TIMEOUT_ENV, raw
        ))),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.socket_path, PathBuf::from("/var/run/setrans/.setrans-unix"));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (SOCKET_ENV, "/tmp/setrans.sock"),
            (CONNECT_TIMEOUT_ENV, "250"),
        ]))
        .unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/setrans.sock"));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_blank_socket_env_is_ignored() {
        let config = ClientConfig::from_lookup(lookup_from(&[(SOCKET_ENV, "  ")])).unwrap();
        assert_eq!(config.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        for raw in ["0", "-5", "soon", ""] {
            let result = ClientConfig::from_lookup(lookup_from(&[(CONNECT_TIMEOUT_ENV, raw)]));
            assert!(
                matches!(result, Err(SetransError::Config(_))),
                "timeout {:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_builder_setters() {
        let config = ClientConfig::default()
            .with_socket_path("/run/test.sock")
            .with_connect_timeout(Duration::from_millis(10));
        assert_eq!(config.socket_path, PathBuf::from("/run/test.sock"));
        assert_eq!(config.connect_timeout, Duration::from_millis(10));
    }
}
