//! Error types for the swarm and its WebSocket client transport.
//!
//! Session-level failures are classified separately by
//! [`FailureKind`](crate::session::FailureKind); this enum carries the
//! underlying cause.

use thiserror::Error;

/// Result type alias for wsswarm operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or driving client sessions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The endpoint URL could not be parsed or has no host.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The endpoint uses a scheme other than `ws`.
    #[error("Unsupported scheme: {0} (only ws:// is supported)")]
    UnsupportedScheme(String),

    /// Invalid WebSocket handshake response.
    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),

    /// Handshake response headers exceed the configured maximum.
    #[error("Handshake too large: {size} bytes (max: {max})")]
    HandshakeTooLarge {
        /// Bytes received so far.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Invalid frame structure or header.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Incomplete frame data.
    #[error("Incomplete frame: need {needed} more bytes")]
    IncompleteFrame {
        /// Number of additional bytes needed.
        needed: usize,
    },

    /// Reserved opcode used.
    #[error("Reserved opcode: {0:#x}")]
    ReservedOpcode(u8),

    /// Invalid opcode value.
    #[error("Invalid opcode: {0:#x}")]
    InvalidOpcode(u8),

    /// Declared payload length does not fit in `usize`.
    #[error("Payload too large for platform: {size} bytes (max: {max})")]
    PayloadTooLargeForPlatform {
        /// Declared payload length.
        size: u64,
        /// Largest length representable on this platform.
        max: u64,
    },

    /// The peer closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// The outgoing payload could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Invalid swarm or transport configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encode(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidEndpoint(err.to_string())
    }
}
