//! PCM audio format description

use std::fmt;

/// Interleaved PCM sample encodings, little-endian signed integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 16-bit
    S16,
    /// 24-bit, packed in 3 bytes
    S24,
    /// 32-bit
    S32,
}

impl SampleFormat {
    /// Storage size of one sample
    #[inline]
    pub fn bytes_per_sample(self) -> u32 {
        match self {
            SampleFormat::S16 => 2,
            SampleFormat::S24 => 3,
            SampleFormat::S32 => 4,
        }
    }

    /// Bit depth as written into container headers
    #[inline]
    pub fn bits_per_sample(self) -> u16 {
        match self {
            SampleFormat::S16 => 16,
            SampleFormat::S24 => 24,
            SampleFormat::S32 => 32,
        }
    }
}

/// A fully defined PCM stream format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Per-sample encoding
    pub format: SampleFormat,
    /// Channel count
    pub channels: u8,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, format: SampleFormat, channels: u8) -> Self {
        Self {
            sample_rate,
            format,
            channels,
        }
    }

    /// Size of one frame (one sample per channel) in bytes
    #[inline]
    pub fn frame_size(&self) -> u32 {
        self.format.bytes_per_sample() * u32::from(self.channels)
    }

    /// Stream data rate in bytes per second
    #[inline]
    pub fn byte_rate(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.frame_size())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.sample_rate,
            self.format.bits_per_sample(),
            self.channels
        )
    }
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
