// Setrans: Request Dispatcher
//
// Runs one request/response exchange end-to-end while holding the
// connection lock, so frames from concurrent callers never interleave on the
// socket. A transport failure gets exactly one reconnect and retry; there is
// no sticky "daemon is down" state, every call gets its own attempt.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::ClientConfig;
use crate::error::{Result, SetransError};
use crate::transport::{Interrupt, UdsTransport};
use crate::wire::{Codec, RequestKind, WireError, HEADER_LEN};

pub(crate) struct Dispatcher {
    config: ClientConfig,
    codec: Codec,
    /// The live connection. `None` after a failed reconnect or after close.
    conn: Mutex<Option<UdsTransport>>,
    /// Lets `close` unblock an exchange that currently holds `conn`.
    interrupt: Mutex<Option<Interrupt>>,
    closed: AtomicBool,
}

impl Dispatcher {
    /// Probe the byte order and dial the daemon. Either failure is fatal.
    pub(crate) fn connect(config: ClientConfig) -> Result<Self> {
        let codec = Codec::native().map_err(SetransError::Initialization)?;
        tracing::debug!(order = ?codec.order(), "Native byte order determined");

        let transport = UdsTransport::connect(&config.socket_path, config.connect_timeout)
            .map_err(|source| SetransError::Connection {
                path: config.socket_path.clone(),
                source,
            })?;
        let interrupt = transport.interrupt().ok();

        Ok(Self {
            config,
            codec,
            conn: Mutex::new(Some(transport)),
            interrupt: Mutex::new(interrupt),
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Send one request and return the daemon's answer.
    pub(crate) fn translate(&self, kind: RequestKind, label: &str) -> Result<String> {
        if self.is_closed() {
            return Err(SetransError::Closed);
        }

        let frame = self
            .codec
            .encode_request(kind, label)
            .map_err(|source| framing(kind, label, source))?;

        let mut conn = lock(&self.conn);
        // close() may have run while we waited for the lock.
        if self.is_closed() {
            return Err(SetransError::Closed);
        }

        tracing::debug!(%kind, label_len = label.len(), "Sending request");
        tracing::trace!(%kind, label, "Request label");

        let result = match self.exchange(&mut conn, &frame, kind, label) {
            Err(err) if err.is_transport() && !self.is_closed() => {
                tracing::warn!(%kind, error = %err, "mcstransd exchange failed, reconnecting");
                self.reconnect(&mut conn, kind, label)
                    .and_then(|()| self.exchange(&mut conn, &frame, kind, label))
            }
            other => other,
        };

        let answer = match result {
            Err(err) if err.is_transport() && self.is_closed() => {
                return Err(SetransError::Closed);
            }
            other => other?,
        };
        drop(conn);

        // The daemon echoes the request back when the level in it does not
        // resolve under the loaded policy. A translation that is genuinely a
        // no-op looks the same and is reported the same way.
        if answer == label {
            return Err(SetransError::InvalidLevel {
                kind,
                label: label.to_string(),
            });
        }

        Ok(answer)
    }

    /// Release the connection and fail every later call. Idempotent.
    pub(crate) fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        // Unblock an in-flight read first, otherwise taking `conn` below could
        // wait on a daemon that never answers.
        if let Some(interrupt) = lock(&self.interrupt).take() {
            interrupt.trigger();
        }
        if let Some(mut transport) = lock(&self.conn).take() {
            transport.close();
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// One write of the request followed by the header and body reads.
    fn exchange(
        &self,
        conn: &mut Option<UdsTransport>,
        frame: &[u8],
        kind: RequestKind,
        label: &str,
    ) -> Result<String> {
        let io_err = |source: io::Error| SetransError::Transport {
            kind,
            label: label.to_string(),
            source,
        };

        let transport = conn.as_mut().ok_or_else(|| {
            io_err(io::Error::new(
                io::ErrorKind::NotConnected,
                "no connection to mcstransd",
            ))
        })?;

        transport.write_all(frame).map_err(io_err)?;

        let mut raw_header = [0u8; HEADER_LEN];
        transport.read_into(&mut raw_header).map_err(io_err)?;
        let header = self.codec.decode_header(&raw_header);
        tracing::debug!(
            function = header.function,
            length = header.length,
            return_code = header.return_code,
            "Received response header"
        );

        let body_len = match header.body_len() {
            Ok(len) => len,
            Err(source) => {
                // The unread body leaves the stream misaligned; start over on
                // the next call.
                *conn = None;
                return Err(framing(kind, label, source));
            }
        };

        let body = transport.read_exact(body_len).map_err(io_err)?;
        self.codec
            .decode_body(&body)
            .map_err(|source| framing(kind, label, source))
    }

    /// Replace the connection in place. Called with `conn` locked.
    fn reconnect(
        &self,
        conn: &mut Option<UdsTransport>,
        kind: RequestKind,
        label: &str,
    ) -> Result<()> {
        if let Some(mut stale) = conn.take() {
            stale.close();
        }

        match UdsTransport::connect(&self.config.socket_path, self.config.connect_timeout) {
            Ok(transport) => {
                self.replace_interrupt(transport.interrupt().ok());
                *conn = Some(transport);
                Ok(())
            }
            Err(source) => {
                tracing::warn!(
                    socket = %self.config.socket_path.display(),
                    error = %source,
                    "Reconnect to mcstransd failed"
                );
                self.replace_interrupt(None);
                Err(SetransError::Transport {
                    kind,
                    label: label.to_string(),
                    source,
                })
            }
        }
    }

    fn replace_interrupt(&self, next: Option<Interrupt>) {
        let mut slot = lock(&self.interrupt);
        *slot = next;
        // close() set the flag before it took this lock, so either it saw the
        // new interrupt or we see the flag here.
        if self.is_closed() {
            if let Some(interrupt) = slot.take() {
                interrupt.trigger();
            }
        }
    }
}

fn framing(kind: RequestKind, label: &str, source: WireError) -> SetransError {
    SetransError::Framing {
        kind,
        label: label.to_string(),
        source,
    }
}

/// The guarded state is valid after any panic, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixture::{FixtureDaemon, Reply};
    use crate::wire::MAX_RESPONSE_LEN;

    #[test]
    fn test_connect_probes_order_and_dials() {
        let daemon = FixtureDaemon::spawn(|req| Reply::answer(format!("ok:{}", req.label)));
        let dispatcher = Dispatcher::connect(daemon.config()).unwrap();

        assert_eq!(dispatcher.socket_path(), daemon.path());
        assert!(!dispatcher.is_closed());
        assert_eq!(
            dispatcher.translate(RequestKind::RawToColor, "s0").unwrap(),
            "ok:s0"
        );
        assert_eq!(daemon.accepted(), 1);
    }

    #[test]
    fn test_request_reaches_daemon_intact() {
        let daemon = FixtureDaemon::spawn(|req| {
            Reply::answer(format!("code={} label={}", req.code, req.label))
        });
        let dispatcher = Dispatcher::connect(daemon.config()).unwrap();

        let answer = dispatcher
            .translate(RequestKind::TranslatedToRaw, "user_u:user_r:user_t:SystemLow")
            .unwrap();
        assert_eq!(answer, "code=3 label=user_u:user_r:user_t:SystemLow");
    }

    #[test]
    fn test_oversized_response_drops_connection() {
        let daemon = FixtureDaemon::spawn(|req| {
            if req.connection == 0 {
                Reply::Raw {
                    length: MAX_RESPONSE_LEN as u32 + 1,
                    body: Vec::new(),
                }
            } else {
                Reply::answer("s0")
            }
        });
        let dispatcher = Dispatcher::connect(daemon.config()).unwrap();

        let err = dispatcher
            .translate(RequestKind::RawToTranslated, "SystemLow")
            .unwrap_err();
        assert!(matches!(
            err,
            SetransError::Framing {
                source: WireError::ResponseTooLarge { .. },
                ..
            }
        ));

        // The next call dials a fresh connection instead of reading garbage.
        let answer = dispatcher
            .translate(RequestKind::RawToTranslated, "SystemLow")
            .unwrap();
        assert_eq!(answer, "s0");
        assert_eq!(daemon.accepted(), 2);
    }

    #[test]
    fn test_missing_connection_is_redialed() {
        let daemon = FixtureDaemon::spawn(|_| Reply::answer("SystemHigh"));
        let dispatcher = Dispatcher::connect(daemon.config()).unwrap();

        lock(&dispatcher.conn).take();
        let answer = dispatcher.translate(RequestKind::RawToTranslated, "s15").unwrap();
        assert_eq!(answer, "SystemHigh");
        assert_eq!(daemon.accepted(), 2);
    }

    #[test]
    fn test_close_releases_connection() {
        let daemon = FixtureDaemon::spawn(|_| Reply::answer("x"));
        let dispatcher = Dispatcher::connect(daemon.config()).unwrap();

        dispatcher.close();
        assert!(dispatcher.is_closed());
        assert!(lock(&dispatcher.conn).is_none());
        assert!(lock(&dispatcher.interrupt).is_none());
    }
}
