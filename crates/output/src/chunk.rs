//! Shared, timestamped chunks of encoded audio
//!
//! One chunk is one encoder read: immutable after construction and shared
//! by reference between the output queue and every client's pending queue.

use std::sync::OnceLock;
use std::time::Instant;

use bytes::Bytes;

use chorale_protocol::TimeVal;

/// One unit of encoded audio, tagged with its submission time
#[derive(Debug)]
pub struct Chunk {
    /// Monotonic timestamp captured at `play` entry
    submitted_at: Instant,
    /// The encoder output
    payload: Bytes,
}

impl Chunk {
    pub fn new(submitted_at: Instant, payload: Bytes) -> Self {
        Self {
            submitted_at,
            payload,
        }
    }

    #[inline]
    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The chunk's wire timestamp
    ///
    /// Measured against a process-wide monotonic anchor, so timestamps are
    /// non-decreasing across the order chunks were produced.
    pub fn wire_timestamp(&self) -> TimeVal {
        TimeVal::from_duration(self.submitted_at.saturating_duration_since(stream_anchor()))
    }
}

/// The monotonic epoch chunk timestamps are measured from
fn stream_anchor() -> Instant {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    *ANCHOR.get_or_init(Instant::now)
}

#[cfg(test)]
#[path = "chunk_test.rs"]
mod tests;
