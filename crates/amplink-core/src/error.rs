//! Error types for amplink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Link failures, malformed replies, bad
//! caller input, and unsupported operations are all captured here.
//!
//! Errors the amplifier itself reports (the `#0,0n` sentinels) are *not*
//! represented here. They are ordinary reply values, logged by the driver
//! and surfaced as "no result".

/// The error type for all amplink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The serial port could not be opened or configured.
    #[error("transport error: {0}")]
    Transport(String),

    /// The amplifier sent something that is not a valid reply line, or a
    /// state field could not be parsed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A write to the link did not complete within the write timeout.
    ///
    /// Read timeouts are not errors; they surface as a "no reply" outcome
    /// of the exchange.
    #[error("timeout writing to amplifier")]
    Timeout,

    /// The requested operation is not supported by this player.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An invalid parameter was passed (volume outside 0..1, empty
    /// decibel range, bad configuration value).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested input source is not in the model's source table.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// No connection to the amplifier has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the amplifier was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("port busy".into());
        assert_eq!(e.to_string(), "transport error: port busy");
    }

    #[test]
    fn error_display_protocol() {
        let e = Error::Protocol("missing value field".into());
        assert_eq!(e.to_string(), "protocol error: missing value field");
    }

    #[test]
    fn error_display_timeout() {
        assert_eq!(Error::Timeout.to_string(), "timeout writing to amplifier");
    }

    #[test]
    fn error_display_unsupported() {
        let e = Error::Unsupported("sound mode selection".into());
        assert_eq!(e.to_string(), "unsupported operation: sound mode selection");
    }

    #[test]
    fn error_display_unknown_source() {
        let e = Error::UnknownSource("Phono".into());
        assert_eq!(e.to_string(), "unknown source: Phono");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
