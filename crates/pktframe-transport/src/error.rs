/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The line has been closed by either side.
    #[error("transport closed")]
    Closed,
}

impl From<TransportError> for std::io::Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Io(io) => io,
            TransportError::Closed => std::io::Error::from(std::io::ErrorKind::BrokenPipe),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
