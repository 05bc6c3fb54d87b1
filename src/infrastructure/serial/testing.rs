//! In-memory stand-ins for a serial device.
//!
//! Used by the test suites and handy for driving the console without
//! hardware attached.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Readable end of an in-memory device.
///
/// Reads block for at most the configured timeout and then fail with
/// `TimedOut`, like a real port. Once the feeding handle is dropped reads
/// fail with `BrokenPipe`, like an unplugged device.
pub struct MemoryPort {
    incoming: mpsc::Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    timeout: Duration,
    _keep_alive: Option<mpsc::Sender<io::Result<Vec<u8>>>>,
}

/// Feeding side of a [`MemoryPort`]
#[derive(Clone)]
pub struct MemoryPortHandle {
    sender: mpsc::Sender<io::Result<Vec<u8>>>,
}

impl MemoryPort {
    pub fn pair(timeout: Duration) -> (Self, MemoryPortHandle) {
        let (sender, incoming) = mpsc::channel();
        let port = Self {
            incoming,
            pending: Vec::new(),
            timeout,
            _keep_alive: None,
        };
        (port, MemoryPortHandle { sender })
    }

    /// A port that never produces data and never hangs up
    pub fn idle() -> Self {
        let (mut port, handle) = Self::pair(Duration::from_millis(10));
        port._keep_alive = Some(handle.sender);
        port
    }
}

impl Read for MemoryPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.incoming.recv_timeout(self.timeout) {
                Ok(Ok(bytes)) => self.pending = bytes,
                Ok(Err(e)) => return Err(e),
                Err(RecvTimeoutError::Timeout) => return Err(io::ErrorKind::TimedOut.into()),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device hung up"))
                }
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

impl MemoryPortHandle {
    /// Make `bytes` available to the next read
    pub fn feed(&self, bytes: &[u8]) {
        let _ = self.sender.send(Ok(bytes.to_vec()));
    }

    /// Make the next read fail with `kind`
    pub fn fail(&self, kind: io::ErrorKind) {
        let _ = self.sender.send(Err(kind.into()));
    }

    /// Simulate the device disappearing
    pub fn hang_up(self) {
        drop(self);
    }
}

/// Writable end that records everything written to it
#[derive(Debug, Clone, Default)]
pub struct SharedSink {
    written: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    pub fn contents(&self) -> Vec<u8> {
        self.written
            .lock()
            .map(|written| written.clone())
            .unwrap_or_default()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "sink poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
