/// A header layout or session configuration that cannot be used.
///
/// Detected when a session is constructed, never while streaming.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The header must be at least one byte wide.
    #[error("header width must be non-zero")]
    ZeroHeaderWidth,

    /// The maximum payload size must be at least one byte.
    #[error("max payload size must be non-zero")]
    ZeroMaxPayload,

    /// Length fields are between 1 and 8 bytes wide.
    #[error("length field width {0} is not in 1..=8")]
    LengthWidth(usize),

    /// A sync marker needs at least one byte.
    #[error("sync marker must not be empty")]
    EmptySyncMarker,

    /// A header field does not fit inside the header.
    #[error("{field} field at offset {offset} (width {width}) exceeds header width {header_width}")]
    FieldOutOfBounds {
        field: &'static str,
        offset: usize,
        width: usize,
        header_width: usize,
    },

    /// Two header fields claim the same bytes.
    #[error("{first} and {second} fields overlap")]
    FieldsOverlap {
        first: &'static str,
        second: &'static str,
    },

    /// A fixed payload length must fit the configured maximum.
    #[error("fixed payload length {fixed} exceeds max payload size {max}")]
    FixedLengthTooLarge { fixed: usize, max: usize },
}

/// Errors that can occur during framing, encoding and stream I/O.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The session configuration is invalid.
    #[error("invalid framing configuration: {0}")]
    Config(#[from] ConfigError),

    /// An outbound payload does not fit the layout or the configured maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An outbound payload does not match the layout's fixed length.
    #[error("payload is {size} bytes, layout requires exactly {expected}")]
    PayloadLengthMismatch { size: usize, expected: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended with an incomplete frame still buffered.
    #[error("connection closed ({buffered} bytes of an incomplete frame buffered)")]
    ConnectionClosed { buffered: usize },

    /// The transport refused an operation.
    #[error("transport error: {0}")]
    Transport(#[from] pktframe_transport::TransportError),

    /// The reader thread panicked or could not be started.
    #[error("reader thread failed: {0}")]
    Thread(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
