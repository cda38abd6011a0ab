// Setrans: Client Handle
//
// The public face of the library. Each operation is a direct call into the
// dispatcher with a fixed request kind.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::wire::RequestKind;

use super::dispatcher::Dispatcher;

/// A connection to mcstransd.
///
/// All calls made through one handle share a single socket and are
/// serialized; the handle can be shared between threads behind an `Arc`.
/// Labels must not contain NUL bytes.
pub struct Client {
    dispatcher: Dispatcher,
}

impl Client {
    /// Connect to the daemon at the well-known socket.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Connect using an explicit configuration. Fails without returning a
    /// handle if the byte order cannot be determined or the dial fails.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            dispatcher: Dispatcher::connect(config)?,
        })
    }

    /// Translate a raw context into its human-readable form.
    pub fn raw_to_translated(&self, raw: &str) -> Result<String> {
        self.translate(RequestKind::RawToTranslated, raw)
    }

    /// Translate a human-readable context back into its raw form.
    pub fn translated_to_raw(&self, translated: &str) -> Result<String> {
        self.translate(RequestKind::TranslatedToRaw, translated)
    }

    /// Look up the display colors of a raw context: a whitespace-separated
    /// list of `#rrggbb` tokens.
    pub fn raw_to_color(&self, raw: &str) -> Result<String> {
        self.translate(RequestKind::RawToColor, raw)
    }

    pub fn translate(&self, kind: RequestKind, label: &str) -> Result<String> {
        self.dispatcher.translate(kind, label)
    }

    /// Close the connection. Blocked and later calls fail with `Closed`.
    pub fn close(&self) -> Result<()> {
        self.dispatcher.close();
        Ok(())
    }

    pub fn socket_path(&self) -> &Path {
        self.dispatcher.socket_path()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.dispatcher.close();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("socket_path", &self.socket_path())
            .field("closed", &self.dispatcher.is_closed())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
