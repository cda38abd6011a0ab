// Setrans: Disabled Client
//
// Stand-in used when label translation is compiled out. Construction always
// succeeds and every operation returns an empty string.

use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::wire::RequestKind;

#[derive(Debug)]
pub struct Client {
    socket_path: PathBuf,
}

impl Client {
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        tracing::debug!("Label translation is disabled in this build");
        Ok(Self {
            socket_path: config.socket_path,
        })
    }

    pub fn raw_to_translated(&self, _raw: &str) -> Result<String> {
        Ok(String::new())
    }

    pub fn translated_to_raw(&self, _translated: &str) -> Result<String> {
        Ok(String::new())
    }

    pub fn raw_to_color(&self, _raw: &str) -> Result<String> {
        Ok(String::new())
    }

    pub fn translate(&self, _kind: RequestKind, _label: &str) -> Result<String> {
        Ok(String::new())
    }

    pub fn close(&self) -> Result<()> {
        Ok(())
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_always_succeeds_empty() {
        let client = Client::new().unwrap();
        assert_eq!(client.raw_to_translated("s0").unwrap(), "");
        assert_eq!(client.translated_to_raw("SystemLow").unwrap(), "");
        assert_eq!(client.raw_to_color("s0").unwrap(), "");
        assert!(client.close().is_ok());
        assert!(client.close().is_ok());
        assert!(!crate::ENABLED);
    }
}
