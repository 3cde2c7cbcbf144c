//! Byte-stream adapters for pktframe sessions.
//!
//! The framing core only needs a byte source and a byte sink. This crate
//! provides the two carriers the rest of the workspace uses:
//! - [`Loopback`]: an in-memory line that reads back what it writes
//! - [`ByteStream`]: a connected Unix stream (Linux/macOS)
//!
//! Opening real serial ports is left to the application; anything that
//! implements `Read`/`Write` can drive a session.

pub mod error;
pub mod loopback;

#[cfg(unix)]
pub mod stream;

pub use error::{Result, TransportError};
pub use loopback::Loopback;

#[cfg(unix)]
pub use stream::ByteStream;
