//! Error types for the encoder crate

use thiserror::Error;

/// Errors that can occur while encoding
#[derive(Error, Debug)]
pub enum EncoderError {
    /// The audio format cannot be represented by this codec
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The codec rejected input
    #[error("encoder write failed: {0}")]
    Write(String),

    /// The codec failed to flush buffered data
    #[error("encoder flush failed: {0}")]
    Flush(String),
}
