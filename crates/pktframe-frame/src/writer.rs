use std::io::{ErrorKind, Write};

use bytes::BytesMut;
#[cfg(unix)]
use pktframe_transport::ByteStream;

use crate::codec::{encode_packet, FrameConfig, Packet};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete packets to any `Write` stream.
///
/// Outbound framing uses the same [`HeaderLayout`](crate::HeaderLayout) as
/// the receiving side. Applications that build their own headers can hand
/// finished frames to [`PacketWriter::write_raw`].
pub struct PacketWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> PacketWriter<T> {
    /// Create a packet writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a packet writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Frame `payload` with the configured layout and send it (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_packet(
            &self.config.layout,
            payload,
            self.config.max_payload_size,
            &mut self.buf,
        )?;

        let frame = self.buf.split().freeze();
        self.write_all_retrying(&frame)?;
        self.flush()
    }

    /// Re-send a packet exactly as it was received.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        self.write_all_retrying(&packet.header)?;
        self.write_all_retrying(&packet.payload)?;
        self.flush()
    }

    /// Send bytes that are already a complete frame.
    pub fn write_raw(&mut self, frame: &[u8]) -> Result<()> {
        self.write_all_retrying(frame)?;
        self.flush()
    }

    fn write_all_retrying(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => {
                    return Err(FrameError::ConnectionClosed {
                        buffered: bytes.len() - offset,
                    })
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current packet writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(unix)]
impl PacketWriter<ByteStream> {
    /// Create a packet writer for `ByteStream` and apply write timeout from config.
    pub fn with_config_stream(inner: ByteStream, config: FrameConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
