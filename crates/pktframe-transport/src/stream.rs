use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use tracing::debug;

use crate::error::Result;

/// A connected byte stream backed by a Unix stream socket.
///
/// Stands in for a point-to-point line: bytes written on one end of a
/// [`ByteStream::pair`] are read, in order and in arbitrary chunk sizes, on
/// the other end.
pub struct ByteStream {
    inner: UnixStream,
}

impl ByteStream {
    /// Create two connected ends.
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = UnixStream::pair()?;
        debug!("opened unix stream pair");
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Wrap an already connected Unix stream.
    pub fn from_unix(stream: UnixStream) -> Self {
        Self { inner: stream }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_unix(cloned))
    }

    /// Shut down the write half so the peer observes EOF.
    pub fn shutdown_write(&self) -> Result<()> {
        self.inner
            .shutdown(std::net::Shutdown::Write)
            .map_err(Into::into)
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for ByteStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStream").field("type", &"unix").finish()
    }
}
