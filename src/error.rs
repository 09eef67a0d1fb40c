//! Error types for kvwire
//!
//! Two layers: [`ProtocolError`] covers everything the codec can reject,
//! [`WireError`] is the unified error for sessions and the CLI.

use thiserror::Error;

/// Result type alias using WireError
pub type Result<T> = std::result::Result<T, WireError>;

/// Errors raised by the command encoder and reply decoder
///
/// None of these are fatal: the caller decides whether to read more bytes
/// (`TruncatedFrame`) or give up on the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid command: at least one argument is required")]
    InvalidCommand,

    #[error("Unknown reply type: 0x{0:02x}")]
    UnknownReplyType(u8),

    #[error("Malformed length field: {0:?}")]
    MalformedLength(String),

    #[error("Malformed integer reply: {0:?}")]
    MalformedInteger(String),

    #[error("Truncated frame: buffer ends before the frame is complete")]
    TruncatedFrame,

    #[error("Missing CRLF terminator after bulk payload")]
    MissingTerminator,
}

impl ProtocolError {
    /// True when more bytes could turn this failure into a successful decode
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ProtocolError::TruncatedFrame)
    }
}

/// Unified error type for kvwire operations
#[derive(Debug, Error)]
pub enum WireError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed by server")]
    ConnectionClosed,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Reply exceeds the {limit} byte limit")]
    ReplyTooLarge { limit: usize },

    // -------------------------------------------------------------------------
    // Authentication Errors
    // -------------------------------------------------------------------------
    #[error("Access denied: {0}")]
    AuthDenied(String),

    #[error("Unexpected {0} reply to AUTH")]
    UnexpectedAuthReply(&'static str),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
