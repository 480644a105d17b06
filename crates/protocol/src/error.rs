//! Error types for the protocol crate

use thiserror::Error;

/// Errors produced while framing or parsing Snapcast messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Malformed or truncated message
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Payload size field exceeds the allowed maximum
    #[error("payload size {size} exceeds limit {limit}")]
    Oversized { size: u32, limit: u32 },

    /// Unknown message type
    #[error("unknown message type: {0}")]
    UnknownType(u16),

    /// Invalid JSON payload (Hello, stream tags)
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}
