//! Streaming audio codec interface
//!
//! A prepared encoder is configured once and opened per stream; the opened
//! [`Encoder`] is a byte-to-byte pump driven from a single producer thread:
//! `write` feeds raw PCM in, `read` drains container-framed output. An
//! encoder may buffer arbitrarily between the two; `read` returning 0 means
//! "nothing available yet", never end-of-stream.
//!
//! Container formats with a prelude (WAV's RIFF/fmt blocks) emit it before
//! any audio is written: the first `read` after `open` yields the codec
//! header.

mod error;
mod format;
mod wave;

pub use error::EncoderError;
pub use format::{AudioFormat, SampleFormat};
pub use wave::{WaveEncoder, WavePrepared};

/// Result type for encoder operations
pub type Result<T> = std::result::Result<T, EncoderError>;

/// An opened, stream-bound encoder
///
/// All methods are called from one producer thread; implementations need no
/// internal locking. Closing is drop-based: dropping the encoder releases
/// whatever the codec holds.
pub trait Encoder: Send {
    /// Feed raw PCM into the encoder
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Force out whatever the codec is holding back
    ///
    /// Best effort; a failed flush must leave the encoder usable.
    fn flush(&mut self) -> Result<()>;

    /// Drain encoded output into `buf`, returning the number of bytes
    /// produced (0 = nothing available yet)
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

/// A configured encoder factory, opened once per stream
pub trait PreparedEncoder: Send + Sync {
    /// Open an encoder for `format`
    ///
    /// The format is taken by `&mut` so the codec can substitute the nearest
    /// representation it supports; the caller streams in the adjusted format.
    fn open(&self, format: &mut AudioFormat) -> Result<Box<dyn Encoder>>;
}
