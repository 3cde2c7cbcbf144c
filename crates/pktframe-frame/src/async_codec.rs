//! `tokio_util::codec` adapter over the framing state machine.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::accumulator::Accumulator;
use crate::codec::{encode_packet, FrameConfig, Packet};
use crate::error::{FrameError, Result};
use crate::machine::{Deframer, FramerState, FramerStats, Step};

/// Tokio codec with the same resync and drop rules as [`Framer`](crate::Framer).
#[derive(Debug)]
pub struct PacketCodec {
    deframer: Deframer,
    // Bytes left in the read buffer after the previous decode.
    seen: usize,
}

impl PacketCodec {
    /// Create a codec, failing fast on an unusable configuration.
    pub fn with_config(config: FrameConfig) -> Result<Self> {
        Ok(Self {
            deframer: Deframer::new(&config)?,
            seen: 0,
        })
    }

    /// Counters for everything decoded so far.
    pub fn stats(&self) -> &FramerStats {
        self.deframer.stats()
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        self.deframer
            .record_received(src.len().saturating_sub(self.seen));
        let mut acc = Accumulator::from(std::mem::take(src));
        let packet = loop {
            match self.deframer.poll(&mut acc) {
                Step::Packet(packet) => break Some(packet),
                Step::Discarded(discard) => trace!(%discard, "discarded input"),
                Step::Pending => break None,
            }
        };
        *src = acc.into_inner();
        self.seen = src.len();
        Ok(packet)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Packet>> {
        if let Some(packet) = self.decode(buf)? {
            return Ok(Some(packet));
        }
        if buf.is_empty() && self.deframer.state() == FramerState::AwaitingHeader {
            return Ok(None);
        }
        Err(FrameError::ConnectionClosed {
            buffered: buf.len(),
        })
    }
}

impl Encoder<&[u8]> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<()> {
        encode_packet(
            self.deframer.layout(),
            item,
            self.deframer.max_payload_size(),
            dst,
        )
    }
}

impl Encoder<Bytes> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&[u8]>::encode(self, item.as_ref(), dst)
    }
}
