//! Length-delimited packet framing for noisy byte streams.
//!
//! This is the core of pktframe. An unbounded byte stream (a serial line, a
//! pipe, a socket) is cut into packets, each a fixed-width header followed by
//! a payload whose length the header declares:
//! - [`Accumulator`] keeps bytes across reads until they form a packet
//! - [`HeaderLayout`] describes where the length, sync marker and checksum live
//! - [`Framer`] validates headers, resynchronizes one byte at a time on
//!   garbage, drops packets with bad checksums, and hands every good packet
//!   to a [`PacketHandler`]
//!
//! Bad data is never an error; only an unusable configuration is.

pub mod accumulator;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod layout;
pub mod machine;
pub mod reader;
pub mod thread;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use accumulator::Accumulator;
pub use checksum::ChecksumKind;
pub use codec::{encode_packet, FrameConfig, Packet, DEFAULT_MAX_PAYLOAD};
pub use error::{ConfigError, FrameError, Result};
pub use layout::{
    ByteOrder, ChecksumField, Coverage, HeaderFault, HeaderLayout, LengthField, ParsedHeader,
    PayloadLength, SyncMarker,
};
pub use machine::{
    handler_fn, Deframer, Discard, FnHandler, Framer, FramerState, FramerStats, PacketHandler,
    Step,
};
pub use reader::PacketReader;
pub use thread::{ReaderOutcome, ReaderThread};
pub use writer::PacketWriter;

#[cfg(feature = "async")]
pub use async_codec::PacketCodec;
