//! The audio-output driver contract
//!
//! The playback pipeline drives an output through this trait; the flags
//! declare which optional operations the output supports.

use std::time::Duration;

use chorale_encoder::AudioFormat;

use crate::tags::Tag;
use crate::Result;

/// Output supports `enable`/`disable`
pub const FLAG_ENABLE_DISABLE: u32 = 1 << 0;
/// Output supports `pause`
pub const FLAG_PAUSE: u32 = 1 << 1;
/// Output requires a fully defined stream format at `open`
pub const FLAG_NEED_FULLY_DEFINED_AUDIO_FORMAT: u32 = 1 << 2;

/// An audio output as seen by the playback pipeline
///
/// All methods are called from the playback thread. They may block but
/// must never be called from inside the runtime.
pub trait AudioOutput {
    /// Capability flags for this output
    fn flags(&self) -> u32;

    /// Bring up the output's external surface (sockets, advertisement)
    fn enable(&mut self) -> Result<()>;

    /// Tear down what `enable` created; the output must be closed
    fn disable(&mut self);

    /// Start a stream in `format`
    ///
    /// The output may adjust the format to the nearest one it supports.
    fn open(&mut self, format: &mut AudioFormat) -> Result<()>;

    /// End the stream and drop every client
    fn close(&mut self);

    /// How long the caller should wait before the next `play`
    fn delay(&mut self) -> Duration;

    /// Submit PCM; returns the number of bytes consumed
    fn play(&mut self, src: &[u8]) -> Result<usize>;

    /// Pause the stream; returns true if pause is supported and the caller
    /// should retry later
    fn pause(&mut self) -> bool;

    /// Block until everything submitted has been delivered
    fn drain(&mut self);

    /// Discard all buffered audio, keeping clients connected
    fn cancel(&mut self);

    /// Forward a metadata update to the clients
    fn send_tag(&mut self, tag: &Tag);
}
