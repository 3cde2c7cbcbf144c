use std::io::{ErrorKind, Read};

#[cfg(unix)]
use pktframe_transport::ByteStream;
use tracing::debug;

use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::machine::{Framer, PacketHandler};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Drives a [`Framer`] from any `Read` stream.
///
/// Each read hands whatever arrived to the session, so packets reach the
/// handler as soon as their last byte is read.
pub struct PacketReader<T, H> {
    inner: T,
    framer: Framer<H>,
    chunk: Vec<u8>,
}

impl<T: Read, H: PacketHandler> PacketReader<T, H> {
    /// Create a packet reader with default configuration.
    pub fn new(inner: T, handler: H) -> Result<Self> {
        Self::with_config(inner, FrameConfig::default(), handler)
    }

    /// Create a packet reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig, handler: H) -> Result<Self> {
        Ok(Self {
            inner,
            framer: Framer::new(config, handler)?,
            chunk: vec![0u8; READ_CHUNK_SIZE],
        })
    }

    /// Read at most `size` bytes per call to the underlying stream.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk = vec![0u8; size.max(1)];
        self
    }

    /// Perform one read and feed it to the session.
    ///
    /// Returns the number of bytes read; `0` means end of stream.
    pub fn pump(&mut self) -> Result<usize> {
        loop {
            match self.inner.read(&mut self.chunk) {
                Ok(n) => {
                    if n > 0 {
                        self.framer.on_bytes_received(&self.chunk[..n]);
                    }
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Read until end of stream.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends with
    /// an incomplete packet (or unmatched bytes) still buffered.
    pub fn run(&mut self) -> Result<()> {
        while self.pump()? > 0 {}

        if self.framer.is_idle() {
            return Ok(());
        }

        let buffered = self.framer.buffered();
        debug!(
            buffered,
            state = ?self.framer.state(),
            "stream ended mid-packet"
        );
        Err(FrameError::ConnectionClosed { buffered })
    }

    /// The session being driven.
    pub fn framer(&self) -> &Framer<H> {
        &self.framer
    }

    pub fn framer_mut(&mut self) -> &mut Framer<H> {
        &mut self.framer
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the stream and the session.
    pub fn into_parts(self) -> (T, Framer<H>) {
        (self.inner, self.framer)
    }
}

#[cfg(unix)]
impl<H: PacketHandler> PacketReader<ByteStream, H> {
    /// Create a packet reader for `ByteStream` and apply read timeout from config.
    pub fn with_config_stream(inner: ByteStream, config: FrameConfig, handler: H) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Self::with_config(inner, config, handler)
    }
}
