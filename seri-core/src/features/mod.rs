//! Log-mel frontend for the emotion classifier.
//!
//! ## Parameters (must match training)
//!
//! | Parameter       | Value          |
//! |-----------------|----------------|
//! | Sample rate     | 16 000 Hz      |
//! | Hann window     | 1024 samples   |
//! | FFT size        | 1024           |
//! | Frequency bins  | 513 (1024/2+1) |
//! | Hop length      | 256 (16 ms)    |
//! | Mel bands       | 64             |
//! | Mel range       | 0–8 000 Hz     |
//! | dB floor        | 80 dB below max|
//! | Frames          | 300 (~4.8 s)   |
//!
//! The output is normalized with the matrix's own mean and standard
//! deviation, then padded or truncated on the time axis to exactly
//! `N_FRAMES`. The ONNX model is exported with this geometry baked in.

pub mod mel;
pub mod stft;

use ndarray::{s, Array2, Array4, Axis};

use self::mel::build_mel_filters;
use self::stft::Stft;

// ── Frontend constants ───────────────────────────────────────────────────────
pub const N_MELS: usize = 64;
pub const N_FFT: usize = 1024;
pub const HOP: usize = 256;
pub const N_FRAMES: usize = 300;
/// Added to the standard deviation before dividing.
pub const NORM_EPSILON: f64 = 1e-8;
const DB_AMIN: f32 = 1e-10;
const DB_TOP: f32 = 80.0;

/// Model input tensor shape: batch × mels × frames × channel.
pub const MODEL_INPUT_SHAPE: [usize; 4] = [1, N_MELS, N_FRAMES, 1];

/// Converts a trimmed 16 kHz waveform into the fixed `(N_MELS, N_FRAMES)`
/// normalized log-mel matrix.
///
/// Holds only precomputed tables (window, FFT plan, filter bank), so one
/// instance is shared freely between threads.
pub struct FeatureExtractor {
    stft: Stft,
    mel_filters: Array2<f32>,
}

impl FeatureExtractor {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            stft: Stft::new(N_FFT, HOP),
            mel_filters: build_mel_filters(
                N_FFT,
                sample_rate,
                N_MELS,
                0.0,
                sample_rate as f32 / 2.0,
            ),
        }
    }

    /// Full frontend: log-mel → normalize → fit to `N_FRAMES`.
    pub fn extract(&self, samples: &[f32]) -> Array2<f32> {
        let mut mel = self.log_mel(samples);
        normalize(&mut mel);
        fit_frames(mel, N_FRAMES)
    }

    /// Mel power spectrogram, shape `(N_MELS, 1 + len / HOP)`.
    pub fn mel_power(&self, samples: &[f32]) -> Array2<f32> {
        self.mel_filters.dot(&self.stft.power(samples))
    }

    /// Mel spectrogram in dB (ref 1.0), before normalization and fitting.
    pub fn log_mel(&self, samples: &[f32]) -> Array2<f32> {
        power_to_db(self.mel_power(samples))
    }
}

/// `10·log10(max(x, 1e-10))`, clipped to 80 dB below the maximum.
pub fn power_to_db(mut power: Array2<f32>) -> Array2<f32> {
    power.mapv_inplace(|v| 10.0 * v.max(DB_AMIN).log10());
    let max_db = power.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let floor = max_db - DB_TOP;
    power.mapv_inplace(|v| v.max(floor));
    power
}

/// Zero mean, unit variance over the whole matrix.
///
/// A constant matrix (near-silent input) maps to all zeros instead of
/// dividing by zero.
pub fn normalize(mel: &mut Array2<f32>) {
    if mel.is_empty() {
        return;
    }
    let n = mel.len() as f64;
    let mean = mel.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = mel
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let denom = var.sqrt() + NORM_EPSILON;
    mel.mapv_inplace(|v| ((v as f64 - mean) / denom) as f32);
}

/// Zero-pad on the right or truncate to exactly `n_frames` columns.
pub fn fit_frames(mel: Array2<f32>, n_frames: usize) -> Array2<f32> {
    let (n_mels, frames) = mel.dim();
    if frames == n_frames {
        return mel;
    }
    if frames > n_frames {
        return mel.slice(s![.., ..n_frames]).to_owned();
    }
    let mut out = Array2::<f32>::zeros((n_mels, n_frames));
    out.slice_mut(s![.., ..frames]).assign(&mel);
    out
}

/// Add the batch and channel axes the model expects: `(1, mels, frames, 1)`.
pub fn to_model_input(features: Array2<f32>) -> Array4<f32> {
    features.insert_axis(Axis(0)).insert_axis(Axis(3))
}
