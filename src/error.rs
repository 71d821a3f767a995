//! Error types for dronewire.

use thiserror::Error;

/// Main error type for all codec and transport operations.
#[derive(Debug, Error)]
pub enum WireError {
    /// Encode-time input outside its documented domain. A caller bug,
    /// surfaced synchronously at the encode call site.
    #[error("validation error: {0}")]
    Validation(String),

    /// Decode-time length mismatch for the claimed tag. Indicates an
    /// internal routing bug if it occurs downstream of the stream decoder.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Invalid transport configuration (e.g. port 0).
    #[error("invalid transport config: {0}")]
    Config(String),

    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Idle timeout exceeded on a connected transport.
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Peer closed the connection while shutdown was not expected.
    #[error("peer closed connection unexpectedly")]
    UnexpectedClose,

    /// The transport has been torn down; no further operations possible.
    #[error("transport closed")]
    Closed,
}

/// Result type alias using WireError.
pub type Result<T> = std::result::Result<T, WireError>;
