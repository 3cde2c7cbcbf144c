use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ConfigError, Result};
use crate::layout::HeaderLayout;

/// Default maximum payload size: 64 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024;

/// A validated packet: header window plus exactly the declared payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The header bytes as received, including fields the layout does not
    /// interpret.
    pub header: Bytes,
    /// The payload.
    pub payload: Bytes,
}

impl Packet {
    /// Create a packet from its parts.
    pub fn new(header: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            header: header.into(),
            payload: payload.into(),
        }
    }

    /// The total wire size of this packet (header + payload).
    pub fn wire_size(&self) -> usize {
        self.header.len() + self.payload.len()
    }
}

/// Encode a payload behind a header built from `layout`.
///
/// Wire format: `layout.width` header bytes, then the payload. The sync
/// marker, length field and checksum are filled in; every other header byte
/// is zero.
pub fn encode_packet(
    layout: &HeaderLayout,
    payload: &[u8],
    max_payload: usize,
    dst: &mut BytesMut,
) -> Result<()> {
    let header = layout.encode_header(payload, max_payload)?;
    dst.reserve(header.len() + payload.len());
    dst.put_slice(&header);
    dst.put_slice(payload);
    Ok(())
}

/// Configuration for a framing session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrameConfig {
    /// Header layout shared by both directions.
    pub layout: HeaderLayout,
    /// Maximum payload size in bytes. Headers declaring more are treated as
    /// corrupt. Default: 64 KiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub write_timeout: Option<std::time::Duration>,
}

impl FrameConfig {
    /// A configuration using `layout` and the default limits.
    pub fn with_layout(layout: HeaderLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Reject layouts and limits that cannot frame anything.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.layout.validate(self.max_payload_size)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            layout: HeaderLayout::default(),
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
