use std::fmt;
use std::io;

use pktframe_frame::FrameError;
use pktframe_transport::TransportError;

// Exit codes follow sysexits where one fits.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const CONFIG: i32 = 78;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::Transport(source) => transport_error(context, source),
        FrameError::Config(_) => CliError::new(CONFIG, format!("{context}: {err}")),
        FrameError::PayloadTooLarge { .. } | FrameError::PayloadLengthMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_map_to_exit_codes() {
        let config = FrameError::Config(pktframe_frame::ConfigError::ZeroMaxPayload);
        assert_eq!(frame_error("x", config).code, CONFIG);

        let too_large = FrameError::PayloadTooLarge { size: 9, max: 4 };
        assert_eq!(frame_error("x", too_large).code, DATA_INVALID);

        let closed = FrameError::ConnectionClosed { buffered: 2 };
        assert_eq!(frame_error("x", closed).code, FAILURE);

        let thread = FrameError::Thread("boom".to_string());
        assert_eq!(frame_error("x", thread).code, INTERNAL);
    }

    #[test]
    fn io_errors_keep_context() {
        let err = io_error(
            "failed reading in.bin",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.code, PERMISSION_DENIED);
        assert!(err.message.starts_with("failed reading in.bin: "));
    }

    #[test]
    fn closed_transport_is_transport_error() {
        let err = frame_error("send failed", FrameError::Transport(TransportError::Closed));
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
