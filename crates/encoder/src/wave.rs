//! Streaming WAV encoder
//!
//! WAV is a passthrough container for little-endian PCM: the encoder emits
//! a 44-byte RIFF prelude once, then forwards samples untouched. Because a
//! live stream's length is unknown, the RIFF and data chunk sizes are set
//! to their streaming maximum; players treat the file as unbounded.

use bytes::{Buf, BufMut, BytesMut};

use crate::{AudioFormat, Encoder, EncoderError, PreparedEncoder, Result};

/// Total size of the RIFF/fmt/data prelude
pub const WAVE_HEADER_LEN: usize = 44;

/// Prepared WAV encoder
///
/// Stateless; opening binds it to a stream format.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavePrepared;

impl WavePrepared {
    pub fn new() -> Self {
        Self
    }
}

impl PreparedEncoder for WavePrepared {
    fn open(&self, format: &mut AudioFormat) -> Result<Box<dyn Encoder>> {
        if format.channels == 0 {
            return Err(EncoderError::UnsupportedFormat("zero channels".into()));
        }
        if format.sample_rate == 0 {
            return Err(EncoderError::UnsupportedFormat("zero sample rate".into()));
        }

        Ok(Box::new(WaveEncoder::new(*format)))
    }
}

/// An opened WAV encoder bound to one stream
pub struct WaveEncoder {
    /// Pending output: the header at open time, PCM afterwards
    buffer: BytesMut,
}

impl WaveEncoder {
    fn new(format: AudioFormat) -> Self {
        let mut buffer = BytesMut::with_capacity(WAVE_HEADER_LEN);
        put_wave_header(&mut buffer, &format);
        Self { buffer }
    }
}

impl Encoder for WaveEncoder {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Nothing is ever held back
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.buffer.len());
        buf[..n].copy_from_slice(&self.buffer[..n]);
        self.buffer.advance(n);
        n
    }
}

fn put_wave_header(buf: &mut BytesMut, format: &AudioFormat) {
    let bits = format.format.bits_per_sample();
    let block_align = format.frame_size() as u16;
    let byte_rate = format.byte_rate() as u32;

    buf.put_slice(b"RIFF");
    buf.put_u32_le(u32::MAX - 8);
    buf.put_slice(b"WAVE");

    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(1); // PCM
    buf.put_u16_le(u16::from(format.channels));
    buf.put_u32_le(format.sample_rate);
    buf.put_u32_le(byte_rate);
    buf.put_u16_le(block_align);
    buf.put_u16_le(bits);

    buf.put_slice(b"data");
    buf.put_u32_le(u32::MAX - WAVE_HEADER_LEN as u32);
}

#[cfg(test)]
#[path = "wave_test.rs"]
mod tests;
