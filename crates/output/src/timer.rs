//! Real-time pacing timer
//!
//! Converts "bytes submitted" into stream time and reports how far ahead of
//! the wall clock the stream has run. The producer sleeps that delay before
//! submitting again, which paces submission at exactly real time: the
//! output never blocks on I/O itself, the timer is the only brake.

use std::time::{Duration, Instant};

use chorale_encoder::AudioFormat;

/// Tracks the stream-time cursor of a paced PCM stream
#[derive(Debug)]
pub struct PaceTimer {
    /// Stream data rate in bytes per second
    byte_rate: u64,
    started: bool,
    /// Wall-clock position of the stream-time cursor
    due: Instant,
}

impl PaceTimer {
    /// Create a timer for a stream in `format`
    pub fn new(format: &AudioFormat) -> Self {
        Self {
            byte_rate: format.byte_rate(),
            started: false,
            due: Instant::now(),
        }
    }

    /// Whether `start` has been called since construction
    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Anchor the cursor to the current clock
    pub fn start(&mut self) {
        self.due = Instant::now();
        self.started = true;
    }

    /// Re-anchor to "now" with a cursor of zero
    pub fn reset(&mut self) {
        self.due = Instant::now();
    }

    /// Advance the cursor by the duration `bytes` of audio represent
    pub fn add(&mut self, bytes: usize) {
        let usec = (bytes as u64).saturating_mul(1_000_000) / self.byte_rate;
        self.due += Duration::from_micros(usec);
    }

    /// Time until the cursor is due, or zero if it is in the past
    pub fn delay(&self) -> Duration {
        self.due.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
#[path = "timer_test.rs"]
mod tests;
