//! Tone generator tests

use chorale_output::{AudioFormat, SampleFormat};

use super::*;

fn cd_format() -> AudioFormat {
    AudioFormat::new(44100, SampleFormat::S16, 2)
}

#[test]
fn test_block_size() {
    let mut tone = ToneGenerator::new(&cd_format(), 440.0);
    let block = tone.next_block(1024);

    // frames × channels × 2 bytes
    assert_eq!(block.len(), 1024 * 2 * 2);
}

#[test]
fn test_channels_carry_identical_samples() {
    let mut tone = ToneGenerator::new(&cd_format(), 440.0);
    let block = tone.next_block(16);

    for frame in block.chunks_exact(4) {
        assert_eq!(frame[0..2], frame[2..4]);
    }
}

#[test]
fn test_amplitude_is_bounded() {
    let mut tone = ToneGenerator::new(&cd_format(), 440.0);
    let block = tone.next_block(44100);

    let limit = (0.25 * f32::from(i16::MAX)) as i16;
    for sample in block.chunks_exact(2) {
        let value = i16::from_le_bytes([sample[0], sample[1]]);
        assert!(value.abs() <= limit, "sample {value} exceeds amplitude");
    }
}

#[test]
fn test_tone_is_not_silence() {
    let mut tone = ToneGenerator::new(&cd_format(), 440.0);
    let block = tone.next_block(1024);

    assert!(block.iter().any(|&b| b != 0));
}

#[test]
fn test_phase_continuity_across_blocks() {
    // Two consecutive small blocks equal one large block
    let mut split = ToneGenerator::new(&cd_format(), 440.0);
    let mut whole = ToneGenerator::new(&cd_format(), 440.0);

    let mut joined = split.next_block(100);
    joined.extend(split.next_block(100));

    assert_eq!(joined, whole.next_block(200));
}
