// Setrans: Unix Domain Socket Transport
//
// Blocking byte transfer over one `UnixStream`. Only the initial dial is
// bounded by a timeout; reads and writes block until the daemon answers.

use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// One connection to the daemon.
#[derive(Debug)]
pub struct UdsTransport {
    path: PathBuf,
    stream: Option<UnixStream>,
}

impl UdsTransport {
    /// Dial the daemon socket, giving up after `timeout`.
    pub fn connect(path: &Path, timeout: Duration) -> io::Result<Self> {
        let stream = dial(path, timeout)?;
        tracing::info!(socket = %path.display(), "Connected to mcstransd");
        Ok(Self {
            path: path.to_path_buf(),
            stream: Some(stream),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole buffer, retrying partial writes internally.
    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stream = self.stream()?;
        stream.write_all(bytes)?;
        stream.flush()
    }

    /// Fill `buf` completely. A premature EOF is `UnexpectedEof`.
    pub fn read_into(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.stream()?.read_exact(buf)
    }

    /// Read exactly `n` bytes.
    pub fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// A handle that can shut this connection down from another thread.
    pub fn interrupt(&self) -> io::Result<Interrupt> {
        self.stream
            .as_ref()
            .ok_or_else(closed)?
            .try_clone()
            .map(Interrupt)
    }

    /// Release the socket. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // Fails with NotConnected if the peer already went away.
            let _ = stream.shutdown(Shutdown::Both);
            tracing::debug!(socket = %self.path.display(), "Closed mcstransd connection");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    fn stream(&mut self) -> io::Result<&mut UnixStream> {
        self.stream.as_mut().ok_or_else(closed)
    }
}

impl Drop for UdsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Shuts a connection down so that a read blocked on it returns.
#[derive(Debug)]
pub struct Interrupt(UnixStream);

impl Interrupt {
    pub fn trigger(&self) {
        let _ = self.0.shutdown(Shutdown::Both);
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection closed")
}

/// `UnixStream` has no connect timeout, so the dial runs on a helper thread
/// and the caller waits for it with a deadline. A dial that outlives the
/// deadline finishes on its own and its stream is dropped.
fn dial(path: &Path, timeout: Duration) -> io::Result<UnixStream> {
    let (tx, rx) = mpsc::channel();
    let target = path.to_path_buf();

    thread::Builder::new()
        .name("setrans-dial".to_string())
        .spawn(move || {
            let _ = tx.send(UnixStream::connect(&target));
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connect timed out after {:?}", timeout),
        )),
        Err(RecvTimeoutError::Disconnected) => {
            Err(io::Error::other("dial thread exited without a result"))
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::time::Instant;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn listener() -> (tempfile::TempDir, PathBuf, UnixListener) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transport.sock");
        let listener = UnixListener::bind(&path).unwrap();
        (dir, path, listener)
    }

    #[test]
    fn test_connect_to_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = UdsTransport::connect(&dir.path().join("absent.sock"), TIMEOUT);
        assert!(result.is_err());
    }

    #[test]
    fn test_connect_times_out_when_backlog_is_full() {
        // Nothing accepts, so every dial parks in the listen queue until the
        // kernel stops admitting new ones and connect blocks.
        let (_dir, path, _listener) = listener();
        let timeout = Duration::from_millis(300);
        let mut queued = Vec::new();

        for _ in 0..65_536 {
            let started = Instant::now();
            match UdsTransport::connect(&path, timeout) {
                Ok(transport) => queued.push(transport),
                Err(err) => {
                    let elapsed = started.elapsed();
                    assert_eq!(err.kind(), io::ErrorKind::TimedOut, "got {:?}", err);
                    assert!(elapsed >= timeout, "gave up after {:?}", elapsed);
                    assert!(elapsed < timeout + TIMEOUT, "gave up after {:?}", elapsed);
                    assert!(!queued.is_empty());
                    return;
                }
            }
        }
        panic!("listen queue never filled");
    }

    #[test]
    fn test_write_then_read_exact() {
        let (_dir, path, listener) = listener();
        let peer = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            conn.read_exact(&mut buf).unwrap();
            conn.write_all(b"world").unwrap();
            buf
        });

        let mut transport = UdsTransport::connect(&path, TIMEOUT).unwrap();
        assert_eq!(transport.path(), path.as_path());
        transport.write_all(b"hello").unwrap();
        assert_eq!(transport.read_exact(5).unwrap(), b"world");
        assert_eq!(&peer.join().unwrap(), b"hello");
    }

    #[test]
    fn test_premature_eof_is_an_error() {
        let (_dir, path, listener) = listener();
        let peer = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            conn.write_all(b"abc").unwrap();
        });

        let mut transport = UdsTransport::connect(&path, TIMEOUT).unwrap();
        peer.join().unwrap();
        let err = transport.read_exact(12).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_close_is_idempotent_and_final() {
        let (_dir, path, _listener) = listener();
        let mut transport = UdsTransport::connect(&path, TIMEOUT).unwrap();

        transport.close();
        transport.close();
        assert!(transport.is_closed());

        assert_eq!(
            transport.write_all(b"x").unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
        assert_eq!(
            transport.read_exact(1).unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
        assert!(transport.interrupt().is_err());
    }

    #[test]
    fn test_interrupt_unblocks_reader() {
        let (_dir, path, listener) = listener();
        let mut transport = UdsTransport::connect(&path, TIMEOUT).unwrap();
        // Keep the peer open so the read would otherwise block forever.
        let (_peer, _) = listener.accept().unwrap();

        let interrupt = transport.interrupt().unwrap();
        let reader = thread::spawn(move || transport.read_exact(4));

        thread::sleep(Duration::from_millis(50));
        interrupt.trigger();

        assert!(reader.join().unwrap().is_err());
    }
}
