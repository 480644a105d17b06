//! Error types for the output crate

use std::io;

use thiserror::Error;

use chorale_encoder::EncoderError;

/// Errors surfaced by the output's lifecycle operations
///
/// Per-client failures are not represented here: a failing session is
/// closed and removed, the output itself keeps running.
#[derive(Error, Debug)]
pub enum OutputError {
    /// Bad configuration (unparseable bind address)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A listener socket could not be bound
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The encoder could not be opened for the stream format
    #[error("failed to open encoder: {0}")]
    EncoderOpen(#[from] EncoderError),

    /// Operation requires an open output
    #[error("output is not open")]
    NotOpen,

    /// `open` called on an already-open output
    #[error("output is already open")]
    AlreadyOpen,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
