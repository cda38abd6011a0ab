// Setrans: In-process fixture daemon for tests
//
// Speaks the daemon side of the mcstransd protocol on a temporary socket.
// Each accepted connection gets its own thread; every request is handed to
// a scripted responder that decides what goes back on the wire.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use crate::config::ClientConfig;
use crate::wire::{ByteOrder, HEADER_LEN, REQUEST_HEADER_LEN};

/// A request as the fixture decoded it.
#[derive(Debug, Clone)]
pub(crate) struct Request {
    /// Zero-based index of the connection it arrived on.
    pub connection: usize,
    pub code: u32,
    pub label: String,
}

pub(crate) enum Reply {
    /// Well-formed body: the text plus a terminator.
    Answer(String),
    /// Exact header length and body bytes, for malformed responses.
    Raw { length: u32, body: Vec<u8> },
    /// Drop the connection without answering.
    Hangup,
    /// Never answer; wait for the client to go away.
    Stall,
    /// Stop sending but keep reading, so the client sees EOF while the
    /// fixture can still notice when the client closes its end.
    HalfClose,
}

impl Reply {
    pub(crate) fn answer(text: impl Into<String>) -> Self {
        Reply::Answer(text.into())
    }
}

pub(crate) struct FixtureDaemon {
    _dir: Option<TempDir>,
    path: PathBuf,
    accepted: Arc<AtomicUsize>,
    released: Arc<Mutex<Vec<usize>>>,
}

impl FixtureDaemon {
    /// Listen on a fresh temporary socket.
    pub(crate) fn spawn<F>(responder: F) -> Self
    where
        F: Fn(Request) -> Reply + Send + Sync + 'static,
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setrans.sock");
        let mut daemon = Self::spawn_at(&path, responder);
        daemon._dir = Some(dir);
        daemon
    }

    /// Listen on a caller-chosen path, e.g. to restart a daemon in place.
    pub(crate) fn spawn_at<F>(path: &Path, responder: F) -> Self
    where
        F: Fn(Request) -> Reply + Send + Sync + 'static,
    {
        let listener = UnixListener::bind(path).unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(Mutex::new(Vec::new()));
        let responder = Arc::new(responder);

        let counter = Arc::clone(&accepted);
        let closed = Arc::clone(&released);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let connection = counter.fetch_add(1, Ordering::SeqCst);
                let responder = Arc::clone(&responder);
                let closed = Arc::clone(&closed);
                thread::spawn(move || {
                    if serve(stream, connection, responder.as_ref()) {
                        closed.lock().unwrap().push(connection);
                    }
                });
            }
        });

        Self {
            _dir: None,
            path: path.to_path_buf(),
            accepted,
            released,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Number of connections accepted so far.
    pub(crate) fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Wait until the client has closed its end of `connection`.
    pub(crate) fn wait_released(&self, connection: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.released.lock().unwrap().contains(&connection) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    pub(crate) fn config(&self) -> ClientConfig {
        ClientConfig::default().with_socket_path(&self.path)
    }
}

/// Answer requests until either side ends the connection. Returns true when
/// the client was the one that went away.
fn serve<F>(mut stream: UnixStream, connection: usize, responder: &F) -> bool
where
    F: Fn(Request) -> Reply,
{
    let order = ByteOrder::native().unwrap();

    loop {
        let mut head = [0u8; REQUEST_HEADER_LEN];
        if stream.read_exact(&mut head).is_err() {
            return true;
        }
        let word = |at: usize| {
            order.decode_u32([head[at], head[at + 1], head[at + 2], head[at + 3]])
        };
        let (code, primary_len, secondary_len) = (word(0), word(4), word(8));

        let mut primary = vec![0u8; primary_len as usize];
        let mut secondary = vec![0u8; secondary_len as usize];
        if stream.read_exact(&mut primary).is_err() || stream.read_exact(&mut secondary).is_err() {
            return true;
        }
        if primary.last() == Some(&0) {
            primary.pop();
        }

        let request = Request {
            connection,
            code,
            label: String::from_utf8_lossy(&primary).into_owned(),
        };

        let (length, body) = match responder(request) {
            Reply::Answer(text) => {
                let mut body = text.into_bytes();
                body.push(0);
                (body.len() as u32, body)
            }
            Reply::Raw { length, body } => (length, body),
            Reply::Hangup => return false,
            Reply::Stall => return drain(&mut stream),
            Reply::HalfClose => {
                let _ = stream.shutdown(Shutdown::Write);
                return drain(&mut stream);
            }
        };

        let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
        frame.extend_from_slice(&order.encode_u32(code));
        frame.extend_from_slice(&order.encode_u32(length));
        frame.extend_from_slice(&order.encode_u32(0));
        frame.extend_from_slice(&body);
        if stream.write_all(&frame).is_err() {
            return false;
        }
    }
}

/// Read and discard until the client closes its end.
fn drain(stream: &mut UnixStream) -> bool {
    let mut sink = [0u8; 64];
    while matches!(stream.read(&mut sink), Ok(n) if n > 0) {}
    true
}
