//! Resynchronizing packet framing for serial lines and other noisy byte
//! streams.
//!
//! pktframe turns an unbounded byte stream into discrete packets, each a
//! fixed-width header followed by a payload whose length the header
//! declares. Corrupt headers are skipped one byte at a time until the stream
//! lines up again; payloads that fail their checksum are dropped.
//!
//! # Crate Structure
//!
//! - [`transport`] - byte stream adapters (in-memory loopback line, Unix stream pair)
//! - [`frame`] - accumulator, header layouts, checksums and the framing state machine

/// Re-export transport types.
pub mod transport {
    pub use pktframe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pktframe_frame::*;
}
