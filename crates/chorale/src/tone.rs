//! Sine test-tone generator

use std::f32::consts::TAU;

use chorale_output::AudioFormat;

/// Peak amplitude relative to full scale
const AMPLITUDE: f32 = 0.2;

/// Generates interleaved 16-bit PCM blocks of a sine tone
pub struct ToneGenerator {
    phase: f32,
    step: f32,
    channels: usize,
}

impl ToneGenerator {
    pub fn new(format: &AudioFormat, frequency: f32) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / format.sample_rate as f32,
            channels: usize::from(format.channels),
        }
    }

    /// Produce the next `frames` frames as raw little-endian PCM
    pub fn next_block(&mut self, frames: usize) -> Vec<u8> {
        let mut block = Vec::with_capacity(frames * self.channels * 2);

        for _ in 0..frames {
            let sample = (self.phase.sin() * AMPLITUDE * f32::from(i16::MAX)) as i16;
            for _ in 0..self.channels {
                block.extend_from_slice(&sample.to_le_bytes());
            }

            self.phase += self.step;
            if self.phase >= TAU {
                self.phase -= TAU;
            }
        }

        block
    }
}

#[cfg(test)]
#[path = "tone_test.rs"]
mod tests;
