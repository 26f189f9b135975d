//! Audio loading: decode → mono → 16 kHz → silence trim.
//!
//! Every analysis stage downstream assumes a [`Waveform`] that is mono,
//! at [`TARGET_SAMPLE_RATE`] and already trimmed. The loaders here are the
//! only way the classifier builds one from external input.

pub mod decode;
pub mod resample;
pub mod trim;

use std::path::Path;

use tracing::debug;

use crate::error::{Result, SeriError};

/// Sample rate every analysis stage runs at (Hz).
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Silence threshold for edge trimming, in dB below the peak frame.
pub const DEFAULT_TOP_DB: f32 = 30.0;

/// A contiguous block of mono PCM samples at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Mono f32 samples, nominally in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Returns the duration of this waveform in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Returns true if the waveform contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Copy of this waveform with leading/trailing silence removed.
    pub fn trimmed(&self, top_db: f32) -> Self {
        Self::new(
            trim::trim_silence(&self.samples, top_db).to_vec(),
            self.sample_rate,
        )
    }
}

/// Decode an audio file to a mono waveform at `target_rate` (untrimmed).
///
/// # Errors
/// `SeriError::AudioLoad` if the file cannot be read or decoded.
pub fn load_file(path: &Path, target_rate: u32) -> Result<Waveform> {
    let bytes = std::fs::read(path)
        .map_err(|e| SeriError::AudioLoad(format!("{}: {e}", path.display())))?;
    let extension = path.extension().and_then(|e| e.to_str());
    load_bytes(&bytes, extension, target_rate)
}

/// Decode an in-memory audio file to a mono waveform at `target_rate`
/// (untrimmed).
pub fn load_bytes(bytes: &[u8], extension: Option<&str>, target_rate: u32) -> Result<Waveform> {
    let decoded = decode::decode(bytes, extension)?;
    let source_rate = decoded.sample_rate;
    let mono = decoded.into_mono();
    let samples = resample::resample(&mono, source_rate, target_rate)?;

    debug!(
        source_rate,
        target_rate,
        samples = samples.len(),
        "audio loaded"
    );
    Ok(Waveform::new(samples, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn loads_and_resamples_stereo_44k1() {
        // 0.5 s stereo, both channels at 0.2
        let samples = vec![0.2f32; 44_100];
        let wf = load_bytes(&wav(&samples, 44_100, 2), Some("wav"), TARGET_SAMPLE_RATE).unwrap();
        assert_eq!(wf.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(wf.samples.len(), 8_000);
        assert!((wf.duration_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn missing_file_is_a_load_failure() {
        let err = load_file(Path::new("/definitely/not/here.wav"), TARGET_SAMPLE_RATE).unwrap_err();
        assert!(matches!(err, SeriError::AudioLoad(_)), "got {err:?}");
    }

    #[test]
    fn trimmed_keeps_rate() {
        let mut samples = vec![0.0f32; 4_096];
        samples.extend((0..8_192).map(|i| if i % 40 < 20 { 0.3 } else { -0.3 }));
        let wf = Waveform::new(samples, TARGET_SAMPLE_RATE).trimmed(DEFAULT_TOP_DB);
        assert_eq!(wf.sample_rate, TARGET_SAMPLE_RATE);
        assert!(wf.samples.len() < 12_288);
        assert!(!wf.is_empty());
    }
}
