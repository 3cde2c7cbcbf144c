use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Result, TransportError};

/// An in-memory line whose writes come back out of its reads.
///
/// Every handle produced by [`Loopback::try_clone`] shares the same line, so
/// one handle can be moved to a reader thread while another keeps writing.
/// Reads block until bytes arrive, the line is closed, or the read timeout
/// elapses.
pub struct Loopback {
    shared: Arc<Shared>,
    read_timeout: Option<Duration>,
}

struct Shared {
    line: Mutex<Line>,
    readable: Condvar,
}

#[derive(Default)]
struct Line {
    pending: VecDeque<u8>,
    closed: bool,
}

impl Loopback {
    /// Open a fresh, empty line.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                line: Mutex::new(Line::default()),
                readable: Condvar::new(),
            }),
            read_timeout: None,
        }
    }

    /// Another handle onto the same line.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            shared: Arc::clone(&self.shared),
            read_timeout: self.read_timeout,
        })
    }

    /// Set how long a read may wait for data. `None` waits indefinitely.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        if timeout == Some(Duration::ZERO) {
            return Err(TransportError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                "read timeout must be non-zero",
            )));
        }
        self.read_timeout = timeout;
        Ok(())
    }

    /// Close the line. Buffered bytes can still be drained; after that every
    /// read returns EOF and every write fails.
    pub fn close(&self) {
        let mut line = self.lock();
        if !line.closed {
            line.closed = true;
            debug!(pending = line.pending.len(), "loopback line closed");
        }
        self.shared.readable.notify_all();
    }

    /// Whether [`Loopback::close`] has been called on any handle.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of bytes written but not yet read.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> MutexGuard<'_, Line> {
        self.shared
            .line
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Loopback {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for Loopback {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let deadline = self.read_timeout.map(|t| Instant::now() + t);
        let mut line = self.lock();

        while line.pending.is_empty() && !line.closed {
            line = match deadline {
                None => self
                    .shared
                    .readable
                    .wait(line)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(std::io::Error::from(ErrorKind::TimedOut));
                    }
                    self.shared
                        .readable
                        .wait_timeout(line, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }

        let n = buf.len().min(line.pending.len());
        for (slot, byte) in buf.iter_mut().zip(line.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for Loopback {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut line = self.lock();
        if line.closed {
            return Err(TransportError::Closed.into());
        }
        line.pending.extend(buf);
        self.shared.readable.notify_all();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for Loopback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let line = self.lock();
        f.debug_struct("Loopback")
            .field("pending", &line.pending.len())
            .field("closed", &line.closed)
            .finish()
    }
}
