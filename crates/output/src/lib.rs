//! Snapcast streaming output
//!
//! Serves a live PCM stream to Snapcast clients over TCP: the playback
//! thread feeds raw audio into [`SnapcastOutput::play`], which encodes it
//! into a WAV container and fans timestamped chunks out to every connected
//! client, each with its own bounded send queue.
//!
//! # Architecture
//!
//! ```text
//! playback thread                      tokio runtime
//! ───────────────                      ─────────────
//! play(pcm)
//!     │ encoder → chunks ──(inject)──→ inject task
//!     │                                    │ push(chunk)
//!     │                               ┌────┴────┐
//!     ▼                               ▼         ▼
//! sleep(delay())                  client A   client B   ← accept task
//!                                 (pending)  (pending)
//!                                     │          │
//!                                     ▼          ▼
//!                                  TCP socket writes
//! ```
//!
//! Exactly two concurrency contexts touch the output: the playback
//! ("producer") thread calling the blocking lifecycle methods, and the
//! runtime tasks doing all socket I/O. A single mutex guards the shared
//! chunk queue and client registry; per-client state is only ever touched
//! by that client's own task and the fan-out paths.
//!
//! Slow clients never stall the stream: a session whose backlog exceeds
//! the per-client cap is dropped.

mod chunk;
mod client;
mod config;
mod driver;
mod error;
mod listener;
mod output;
mod tags;
mod timer;
#[cfg(feature = "zeroconf")]
mod zeroconf;

pub use chunk::Chunk;
pub use config::SnapcastConfig;
pub use driver::{
    AudioOutput, FLAG_ENABLE_DISABLE, FLAG_NEED_FULLY_DEFINED_AUDIO_FORMAT, FLAG_PAUSE,
};
pub use error::OutputError;
pub use output::SnapcastOutput;
pub use tags::{stream_tags_json, Tag, TagKind};
pub use timer::PaceTimer;

pub use chorale_encoder::{AudioFormat, SampleFormat};

/// Result type for output operations
pub type Result<T> = std::result::Result<T, OutputError>;
