//! Audio capture and analysis module
//!
//! Recording happens in an external pw-record subprocess (see
//! [`recorder`]); this module owns the capture parameters and the raw
//! sample decoding shared by the daemon and the device test
//! orchestrator.

pub mod analysis;
pub mod recorder;

use std::path::Path;

/// Audio samples decoded from a capture (f32, little-endian)
pub type AudioBuffer = Vec<f32>;

/// Default sample rate in Hz (what Whisper-family models expect)
pub const SAMPLE_RATE: u32 = 16000;

/// Default channel count (mono)
pub const CHANNELS: u16 = 1;

/// Default sample format passed to pw-record
pub const SAMPLE_FORMAT: &str = "f32";

/// Load a raw capture file as little-endian f32 samples.
///
/// A trailing partial sample (byte length not a multiple of 4) is
/// truncated.
pub fn load_raw_f32(path: &Path) -> std::io::Result<AudioBuffer> {
    let data = std::fs::read(path)?;
    let samples = data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_samples(samples: &[f32]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for s in samples {
            file.write_all(&s.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_raw_f32_round_trip() {
        let file = write_samples(&[0.0, 0.5, -0.5, 1.0]);
        let samples = load_raw_f32(file.path()).unwrap();
        assert_eq!(samples, vec![0.0, 0.5, -0.5, 1.0]);
    }

    #[test]
    fn test_load_raw_f32_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let samples = load_raw_f32(file.path()).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_load_raw_f32_truncates_partial_sample() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&0.25f32.to_le_bytes()).unwrap();
        file.write_all(&[0xde, 0xad, 0xbe]).unwrap(); // 3 stray bytes
        file.flush().unwrap();

        let samples = load_raw_f32(file.path()).unwrap();
        assert_eq!(samples, vec![0.25]);
    }
}
