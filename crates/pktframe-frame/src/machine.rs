//! The framing state machine.
//!
//! [`Deframer`] is the pure transition function: given an [`Accumulator`] it
//! makes at most one observable step (a packet, a discard, or nothing to do
//! until more bytes arrive). [`Framer`] binds a deframer, its accumulator and
//! a [`PacketHandler`] into one session and drains every complete packet
//! after each chunk of input.
//!
//! Corrupt input never surfaces as an error:
//! - a header with a bad sync marker or an out-of-range length drops exactly
//!   one byte and the search for a header restarts at the next byte;
//! - a packet whose checksum does not match is dropped whole.

use std::sync::mpsc::Sender;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::accumulator::Accumulator;
use crate::codec::{FrameConfig, Packet};
use crate::error::Result;
use crate::layout::{HeaderFault, HeaderLayout, ParsedHeader};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Observable parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// Searching for a valid header.
    AwaitingHeader,
    /// A header was accepted; waiting for `expected` payload bytes.
    AwaitingPayload { expected: usize },
}

/// A transient framing error, recovered from locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Discard {
    /// The sync marker did not match; one byte skipped.
    #[error("sync marker mismatch")]
    SyncMismatch,
    /// The header declared an unusable length; one byte skipped.
    #[error("declared length {declared} out of range")]
    LengthOutOfRange { declared: u64 },
    /// The packet's checksum did not match; packet dropped.
    #[error("checksum mismatch (header {carried:#x}, computed {computed:#x})")]
    ChecksumMismatch { carried: u32, computed: u32 },
}

impl From<HeaderFault> for Discard {
    fn from(fault: HeaderFault) -> Self {
        match fault {
            HeaderFault::SyncMismatch => Discard::SyncMismatch,
            HeaderFault::LengthOutOfRange { declared } => Discard::LengthOutOfRange { declared },
        }
    }
}

/// Outcome of one [`Deframer::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A complete, validated packet.
    Packet(Packet),
    /// Input was discarded; more progress may be possible.
    Discarded(Discard),
    /// Not enough bytes buffered for the current state.
    Pending,
}

/// Counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FramerStats {
    /// Bytes handed to the session.
    pub bytes_received: u64,
    /// Packets delivered to the handler.
    pub packets_delivered: u64,
    /// Bytes dropped one at a time while resynchronizing.
    pub bytes_skipped: u64,
    /// Header windows whose sync marker did not match.
    pub sync_mismatches: u64,
    /// Header windows declaring a length beyond the maximum payload size.
    pub oversized_lengths: u64,
    /// Packets dropped because their checksum did not match.
    pub checksum_failures: u64,
}

impl FramerStats {
    /// Header windows rejected.
    pub fn resyncs(&self) -> u64 {
        self.sync_mismatches + self.oversized_lengths
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    AwaitingHeader,
    AwaitingPayload {
        header: Bytes,
        parsed: ParsedHeader,
    },
}

/// Header/payload state machine over an [`Accumulator`] it does not own.
#[derive(Debug)]
pub struct Deframer {
    layout: HeaderLayout,
    max_payload: usize,
    state: State,
    stats: FramerStats,
}

impl Deframer {
    /// Create a deframer, failing fast on an unusable configuration.
    pub fn new(config: &FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            layout: config.layout.clone(),
            max_payload: config.max_payload_size,
            state: State::AwaitingHeader,
            stats: FramerStats::default(),
        })
    }

    /// Make progress on `acc` until a packet is produced, input is
    /// discarded, or the current state needs more bytes.
    pub fn poll(&mut self, acc: &mut Accumulator) -> Step {
        loop {
            match std::mem::take(&mut self.state) {
                State::AwaitingHeader => {
                    let parsed = match acc.peek(self.layout.width) {
                        Some(window) => self.layout.parse(window, self.max_payload),
                        None => return Step::Pending,
                    };
                    match parsed {
                        Ok(parsed) => {
                            let header = acc.consume(self.layout.width);
                            trace!(payload_len = parsed.payload_len, "header accepted");
                            self.state = State::AwaitingPayload { header, parsed };
                        }
                        Err(fault) => return self.resync(acc, fault),
                    }
                }
                State::AwaitingPayload { header, parsed } => {
                    if acc.len() < parsed.payload_len {
                        self.state = State::AwaitingPayload { header, parsed };
                        return Step::Pending;
                    }
                    let payload = acc.consume(parsed.payload_len);
                    return self.finish(header, parsed, payload);
                }
            }
        }
    }

    fn resync(&mut self, acc: &mut Accumulator, fault: HeaderFault) -> Step {
        acc.skip(1);
        self.stats.bytes_skipped += 1;
        match fault {
            HeaderFault::SyncMismatch => self.stats.sync_mismatches += 1,
            HeaderFault::LengthOutOfRange { declared } => {
                self.stats.oversized_lengths += 1;
                debug!(
                    declared,
                    max = self.max_payload,
                    "header length out of range, skipping one byte"
                );
            }
        }
        Step::Discarded(fault.into())
    }

    fn finish(&mut self, header: Bytes, parsed: ParsedHeader, payload: Bytes) -> Step {
        if let (Some(carried), Some(computed)) =
            (parsed.checksum, self.layout.checksum_of(&header, &payload))
        {
            if carried != computed {
                self.stats.checksum_failures += 1;
                debug!(
                    carried,
                    computed,
                    payload_len = payload.len(),
                    "checksum mismatch, dropping packet"
                );
                return Step::Discarded(Discard::ChecksumMismatch { carried, computed });
            }
        }
        self.stats.packets_delivered += 1;
        Step::Packet(Packet { header, payload })
    }

    /// Current parser state.
    pub fn state(&self) -> FramerState {
        match &self.state {
            State::AwaitingHeader => FramerState::AwaitingHeader,
            State::AwaitingPayload { parsed, .. } => FramerState::AwaitingPayload {
                expected: parsed.payload_len,
            },
        }
    }

    pub fn stats(&self) -> &FramerStats {
        &self.stats
    }

    pub fn layout(&self) -> &HeaderLayout {
        &self.layout
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload
    }

    /// Forget any accepted header and return to `AwaitingHeader`.
    pub fn reset(&mut self) {
        self.state = State::AwaitingHeader;
    }

    pub(crate) fn record_received(&mut self, n: usize) {
        self.stats.bytes_received += n as u64;
    }
}

/// Consumer of validated packets.
///
/// Called synchronously on the thread that feeds the session; a slow handler
/// stalls the session, so hand heavy work off elsewhere (see the `Sender`
/// implementation).
pub trait PacketHandler {
    /// Called once per validated packet, in arrival order.
    fn on_packet(&mut self, packet: Packet);

    /// Called for every transient framing error.
    fn on_discard(&mut self, discard: &Discard) {
        let _ = discard;
    }
}

impl PacketHandler for Vec<Packet> {
    fn on_packet(&mut self, packet: Packet) {
        self.push(packet);
    }
}

impl PacketHandler for Sender<Packet> {
    fn on_packet(&mut self, packet: Packet) {
        if self.send(packet).is_err() {
            debug!("packet receiver dropped");
        }
    }
}

impl<H: PacketHandler + ?Sized> PacketHandler for &mut H {
    fn on_packet(&mut self, packet: Packet) {
        (**self).on_packet(packet);
    }

    fn on_discard(&mut self, discard: &Discard) {
        (**self).on_discard(discard);
    }
}

impl<H: PacketHandler + ?Sized> PacketHandler for Box<H> {
    fn on_packet(&mut self, packet: Packet) {
        (**self).on_packet(packet);
    }

    fn on_discard(&mut self, discard: &Discard) {
        (**self).on_discard(discard);
    }
}

/// A [`PacketHandler`] backed by a closure.
pub struct FnHandler<F>(F);

/// Wrap a closure as a [`PacketHandler`].
pub fn handler_fn<F: FnMut(Packet)>(f: F) -> FnHandler<F> {
    FnHandler(f)
}

impl<F: FnMut(Packet)> PacketHandler for FnHandler<F> {
    fn on_packet(&mut self, packet: Packet) {
        (self.0)(packet);
    }
}

/// One framing session: accumulator, state machine and consumer.
///
/// Must be fed from one thread at a time; it holds no locks.
pub struct Framer<H> {
    acc: Accumulator,
    deframer: Deframer,
    handler: H,
}

impl<H: PacketHandler> Framer<H> {
    /// Create a session. Fails only on invalid configuration.
    pub fn new(config: FrameConfig, handler: H) -> Result<Self> {
        let deframer = Deframer::new(&config)?;
        let capacity = config
            .layout
            .width
            .saturating_add(config.max_payload_size)
            .min(INITIAL_BUFFER_CAPACITY);
        Ok(Self {
            acc: Accumulator::with_capacity(capacity),
            deframer,
            handler,
        })
    }

    /// Feed bytes from the transport, delivering every packet they complete.
    ///
    /// Chunks may be any size and need not align with packet boundaries.
    /// Returns the number of packets delivered by this call.
    pub fn on_bytes_received(&mut self, bytes: &[u8]) -> usize {
        trace!(len = bytes.len(), buffered = self.acc.len(), "bytes received");
        self.deframer.record_received(bytes.len());
        self.acc.append(bytes);
        self.drain()
    }

    fn drain(&mut self) -> usize {
        let mut delivered = 0usize;
        loop {
            match self.deframer.poll(&mut self.acc) {
                Step::Packet(packet) => {
                    delivered += 1;
                    self.handler.on_packet(packet);
                }
                Step::Discarded(discard) => self.handler.on_discard(&discard),
                Step::Pending => return delivered,
            }
        }
    }

    /// Current parser state.
    pub fn state(&self) -> FramerState {
        self.deframer.state()
    }

    /// Bytes received but not yet part of a delivered or discarded packet
    /// (an accepted header is not counted).
    pub fn buffered(&self) -> usize {
        self.acc.len()
    }

    /// Whether the session sits between packets with nothing buffered.
    pub fn is_idle(&self) -> bool {
        self.acc.is_empty() && self.deframer.state() == FramerState::AwaitingHeader
    }

    pub fn stats(&self) -> &FramerStats {
        self.deframer.stats()
    }

    pub fn layout(&self) -> &HeaderLayout {
        self.deframer.layout()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Tear the session down, returning the handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Discard buffered bytes and any accepted header.
    pub fn reset(&mut self) {
        debug!(discarded = self.acc.len(), "framer reset");
        self.acc.clear();
        self.deframer.reset();
    }
}

impl<H> std::fmt::Debug for Framer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framer")
            .field("state", &self.deframer.state())
            .field("buffered", &self.acc.len())
            .field("stats", self.deframer.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::checksum::ChecksumKind;
    use crate::codec::encode_packet;
    use crate::error::{ConfigError, FrameError};
    use crate::layout::{ByteOrder, ChecksumField, LengthField, PayloadLength};

    const MAX: usize = 64;

    fn config() -> FrameConfig {
        FrameConfig {
            max_payload_size: MAX,
            ..FrameConfig::default()
        }
    }

    fn framer() -> Framer<Vec<Packet>> {
        Framer::new(config(), Vec::<Packet>::new()).unwrap()
    }

    fn encode(payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_packet(&HeaderLayout::default(), payload, MAX, &mut buf).unwrap();
        buf.to_vec()
    }

    fn payloads(framer: &Framer<Vec<Packet>>) -> Vec<Vec<u8>> {
        framer
            .handler()
            .iter()
            .map(|p| p.payload.to_vec())
            .collect()
    }

    #[test]
    fn byte_by_byte_scenario() {
        let wire = [0x03, 0x00, 0x06, 1, 2, 3];
        let mut framer = framer();

        for (i, byte) in wire.iter().enumerate() {
            let delivered = framer.on_bytes_received(&[*byte]);
            if i < wire.len() - 1 {
                assert_eq!(delivered, 0, "delivered early at byte {i}");
            } else {
                assert_eq!(delivered, 1);
            }
        }

        assert_eq!(payloads(&framer), vec![vec![1, 2, 3]]);
        assert_eq!(framer.handler()[0].header.as_ref(), &[0x03, 0x00, 0x06]);
        assert!(framer.is_idle());
    }

    #[test]
    fn every_split_offset_delivers_once() {
        let wire = encode(b"split me anywhere");
        for at in 0..=wire.len() {
            let mut framer = framer();
            framer.on_bytes_received(&wire[..at]);
            framer.on_bytes_received(&wire[at..]);
            assert_eq!(
                payloads(&framer),
                vec![b"split me anywhere".to_vec()],
                "split at {at}"
            );
        }
    }

    #[test]
    fn every_chunk_size_delivers_once() {
        let wire = encode(&[0x5A; 40]);
        for chunk in 1..=wire.len() {
            let mut framer = framer();
            for piece in wire.chunks(chunk) {
                framer.on_bytes_received(piece);
            }
            assert_eq!(payloads(&framer), vec![vec![0x5A; 40]], "chunk size {chunk}");
        }
    }

    #[test]
    fn drains_many_packets_from_one_chunk() {
        let messages: Vec<Vec<u8>> = (0..10u8).map(|i| vec![i; i as usize]).collect();
        let wire: Vec<u8> = messages.iter().flat_map(|m| encode(m)).collect();

        let mut framer = framer();
        assert_eq!(framer.on_bytes_received(&wire), messages.len());
        assert_eq!(payloads(&framer), messages);
        assert_eq!(framer.stats().packets_delivered, 10);
        assert_eq!(framer.stats().bytes_received, wire.len() as u64);
    }

    #[test]
    fn empty_payload_packet_delivered() {
        let mut framer = framer();
        assert_eq!(framer.on_bytes_received(&[0, 0, 0]), 1);
        assert!(framer.handler()[0].payload.is_empty());
    }

    #[test]
    fn single_noise_byte_before_packet_recovers() {
        let wire = encode(&[1, 2, 3]);
        for noise in 0..=u8::MAX {
            let mut framer = framer();
            framer.on_bytes_received(&[noise]);
            framer.on_bytes_received(&wire);
            assert_eq!(
                payloads(&framer),
                vec![vec![1, 2, 3]],
                "noise byte {noise:#04x}"
            );
        }
    }

    #[test]
    fn noise_byte_rejected_by_length_resyncs_exactly() {
        // 0xFF followed by 0x03 declares 0x03FF, beyond the max.
        let mut framer = framer();
        let mut wire = vec![0xFF];
        wire.extend(encode(&[1, 2, 3]));

        assert_eq!(framer.on_bytes_received(&wire), 1);
        assert_eq!(payloads(&framer), vec![vec![1, 2, 3]]);
        assert_eq!(framer.stats().bytes_skipped, 1);
        assert_eq!(framer.stats().oversized_lengths, 1);
    }

    #[test]
    fn corrupted_checksum_dropped_then_recovers() {
        let mut bad = encode(&[1, 2, 3]);
        bad[2] ^= 0xFF;

        let mut framer = framer();
        assert_eq!(framer.on_bytes_received(&bad), 0);
        assert!(framer.handler().is_empty());
        assert_eq!(framer.state(), FramerState::AwaitingHeader);
        assert_eq!(framer.stats().checksum_failures, 1);
        assert_eq!(framer.buffered(), 0);

        assert_eq!(framer.on_bytes_received(&encode(&[4, 5])), 1);
        assert_eq!(payloads(&framer), vec![vec![4, 5]]);
    }

    #[test]
    fn corrupted_payload_dropped() {
        let mut bad = encode(b"abcdef");
        let last = bad.len() - 1;
        bad[last] ^= 0x01;

        let mut framer = framer();
        framer.on_bytes_received(&bad);
        framer.on_bytes_received(&encode(b"ok"));
        assert_eq!(payloads(&framer), vec![b"ok".to_vec()]);
    }

    #[test]
    fn oversized_length_never_waits_for_payload() {
        let mut framer = framer();
        // Declares 0xFFFF bytes; max is 64.
        framer.on_bytes_received(&[0xFF, 0xFF, 0x00]);

        assert_eq!(framer.state(), FramerState::AwaitingHeader);
        assert_eq!(framer.buffered(), 2);
        assert_eq!(framer.stats().oversized_lengths, 1);
        assert_eq!(framer.stats().bytes_skipped, 1);
    }

    #[test]
    fn max_payload_boundary() {
        let mut at_max = framer();
        at_max.on_bytes_received(&encode(&[7; MAX]));
        assert_eq!(at_max.handler().len(), 1);

        let body = vec![0xEE; MAX + 1];
        let sum = ChecksumKind::Sum8.compute([&body[..]]) as u8;
        let mut too_big = vec![(MAX + 1) as u8, 0x00, sum];
        too_big.extend_from_slice(&body);

        let mut over_max = framer();
        over_max.on_bytes_received(&too_big);
        assert!(over_max.handler().is_empty());
        assert_eq!(over_max.state(), FramerState::AwaitingHeader);
        assert_eq!(over_max.buffered(), 2);
        assert_eq!(
            over_max.stats().oversized_lengths,
            over_max.stats().bytes_skipped
        );
    }

    #[test]
    fn truncated_stream_waits_in_payload_state() {
        let wire = encode(b"truncated");
        let mut framer = framer();
        framer.on_bytes_received(&wire[..wire.len() - 2]);

        assert_eq!(
            framer.state(),
            FramerState::AwaitingPayload { expected: 9 }
        );
        assert_eq!(framer.buffered(), 7);
        assert!(!framer.is_idle());
        assert!(framer.handler().is_empty());
    }

    #[test]
    fn reset_discards_partial_packet() {
        let wire = encode(b"partial");
        let mut framer = framer();
        framer.on_bytes_received(&wire[..5]);
        framer.reset();

        assert!(framer.is_idle());
        framer.on_bytes_received(&encode(b"fresh"));
        assert_eq!(payloads(&framer), vec![b"fresh".to_vec()]);
    }

    #[test]
    fn sync_marker_resync_skips_garbage() {
        let layout = HeaderLayout::new(
            3,
            PayloadLength::Declared(LengthField::new(2, 1, ByteOrder::Little)),
        )
        .with_sync(0, &[0xAA, 0x55]);
        let cfg = FrameConfig {
            max_payload_size: MAX,
            ..FrameConfig::with_layout(layout.clone())
        };

        let mut wire = vec![0x00, 0xAA, 0x13, 0xAA];
        let mut packet = BytesMut::new();
        encode_packet(&layout, b"hi", MAX, &mut packet).unwrap();
        wire.extend_from_slice(&packet);

        let mut framer = Framer::new(cfg, Vec::<Packet>::new()).unwrap();
        framer.on_bytes_received(&wire);

        assert_eq!(payloads(&framer), vec![b"hi".to_vec()]);
        assert_eq!(framer.stats().sync_mismatches, 4);
        assert_eq!(framer.stats().bytes_skipped, 4);
    }

    #[test]
    fn fixed_length_packets() {
        let layout = HeaderLayout::fixed(b"PKT", 4);
        let cfg = FrameConfig::with_layout(layout);
        let mut framer = Framer::new(cfg, Vec::<Packet>::new()).unwrap();

        framer.on_bytes_received(b"PKTabcdPK");
        framer.on_bytes_received(b"Tefgh");

        assert_eq!(payloads(&framer), vec![b"abcd".to_vec(), b"efgh".to_vec()]);
    }

    #[test]
    fn frame_coverage_checksum_detects_header_corruption() {
        let layout = HeaderLayout::new(
            4,
            PayloadLength::Declared(LengthField::new(0, 2, ByteOrder::Big)),
        )
        .with_checksum(ChecksumField::new(ChecksumKind::Xor8, 3).over_frame());
        let cfg = FrameConfig::with_layout(layout.clone());

        let mut wire = BytesMut::new();
        encode_packet(&layout, b"data", 1024, &mut wire).unwrap();
        let mut corrupted = wire.to_vec();
        corrupted[2] = 0x42;

        let mut framer = Framer::new(cfg, Vec::<Packet>::new()).unwrap();
        framer.on_bytes_received(&corrupted);
        assert!(framer.handler().is_empty());
        framer.on_bytes_received(&wire);
        assert_eq!(payloads(&framer), vec![b"data".to_vec()]);
    }

    #[test]
    fn no_checksum_configured_delivers_unchecked() {
        let layout = HeaderLayout::new(
            1,
            PayloadLength::Declared(LengthField::new(0, 1, ByteOrder::Little)),
        );
        let cfg = FrameConfig::with_layout(layout);
        let mut framer = Framer::new(cfg, Vec::<Packet>::new()).unwrap();
        framer.on_bytes_received(&[2, 0xDE, 0xAD]);
        assert_eq!(payloads(&framer), vec![vec![0xDE, 0xAD]]);
    }

    #[test]
    fn invalid_config_fails_at_construction() {
        let cfg = FrameConfig {
            max_payload_size: 0,
            ..FrameConfig::default()
        };
        let err = Framer::new(cfg, Vec::<Packet>::new()).unwrap_err();
        assert!(matches!(err, FrameError::Config(ConfigError::ZeroMaxPayload)));

        let cfg = FrameConfig::with_layout(HeaderLayout::new(0, PayloadLength::Fixed(1)));
        let err = Framer::new(cfg, Vec::<Packet>::new()).unwrap_err();
        assert!(matches!(err, FrameError::Config(ConfigError::ZeroHeaderWidth)));
    }

    #[test]
    fn out_of_bounds_fields_rejected_before_any_parse() {
        let layout = HeaderLayout::new(2, PayloadLength::Fixed(1)).with_sync(4, b"S");
        let err = Deframer::new(&FrameConfig::with_layout(layout)).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Config(ConfigError::FieldOutOfBounds { field: "sync", .. })
        ));

        let layout = HeaderLayout::length_prefixed_sum8()
            .with_checksum(ChecksumField::new(ChecksumKind::Crc32, 1));
        let err = Framer::new(FrameConfig::with_layout(layout), Vec::<Packet>::new()).unwrap_err();
        assert!(matches!(err, FrameError::Config(_)));
    }

    #[derive(Default)]
    struct Recording {
        packets: usize,
        discards: Vec<Discard>,
    }

    impl PacketHandler for Recording {
        fn on_packet(&mut self, _packet: Packet) {
            self.packets += 1;
        }

        fn on_discard(&mut self, discard: &Discard) {
            self.discards.push(*discard);
        }
    }

    #[test]
    fn discards_reach_handler() {
        let mut bad = encode(&[9]);
        bad[2] = 0;

        let mut framer = Framer::new(config(), Recording::default()).unwrap();
        framer.on_bytes_received(&bad);

        assert_eq!(framer.handler().packets, 0);
        assert_eq!(
            framer.handler().discards,
            vec![Discard::ChecksumMismatch {
                carried: 0,
                computed: 9
            }]
        );
    }

    #[test]
    fn closure_and_channel_handlers() {
        let mut count = 0usize;
        {
            let mut framer = Framer::new(config(), handler_fn(|_| count += 1)).unwrap();
            framer.on_bytes_received(&encode(b"a"));
            framer.on_bytes_received(&encode(b"b"));
        }
        assert_eq!(count, 2);

        let (tx, rx) = std::sync::mpsc::channel();
        let mut framer = Framer::new(config(), tx).unwrap();
        framer.on_bytes_received(&encode(b"queued"));
        assert_eq!(rx.try_recv().unwrap().payload.as_ref(), b"queued");
    }

    #[test]
    fn borrowed_handler_keeps_ownership() {
        let mut sink = Vec::<Packet>::new();
        {
            let mut framer = Framer::new(config(), &mut sink).unwrap();
            framer.on_bytes_received(&encode(b"borrowed"));
        }
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn deframer_over_external_accumulator() {
        let mut deframer = Deframer::new(&config()).unwrap();
        let mut acc = Accumulator::new();

        assert_eq!(deframer.poll(&mut acc), Step::Pending);
        acc.append(&[0xFF]);
        acc.append(&encode(b"x"));

        assert_eq!(
            deframer.poll(&mut acc),
            Step::Discarded(Discard::LengthOutOfRange { declared: 0x01FF })
        );
        match deframer.poll(&mut acc) {
            Step::Packet(packet) => assert_eq!(packet.payload.as_ref(), b"x"),
            other => panic!("expected packet, got {other:?}"),
        }
        assert_eq!(deframer.poll(&mut acc), Step::Pending);
        assert!(acc.is_empty());
    }

    #[test]
    fn handler_mut_between_chunks() {
        let mut framer = framer();
        framer.on_bytes_received(&encode(b"one"));
        let first: Vec<Packet> = framer.handler_mut().drain(..).collect();
        framer.on_bytes_received(&encode(b"two"));

        assert_eq!(first.len(), 1);
        assert_eq!(framer.handler().len(), 1);
        assert_eq!(framer.handler()[0].payload.as_ref(), b"two");
    }
}
