//! Leading/trailing silence removal.
//!
//! ## Algorithm
//!
//! 1. Frame the signal (2048 samples, hop 512), centered with zero padding.
//! 2. Per-frame mean power, converted to dB relative to the loudest frame.
//! 3. Frames above `-top_db` are non-silent; keep the span from the first
//!    to the last of them.
//!
//! Digital silence (peak frame power at the 1e-10 floor) trims to an empty
//! slice so callers see "nothing to analyse" rather than a clip of zeros.

use std::ops::Range;

pub const TRIM_FRAME_LENGTH: usize = 2048;
pub const TRIM_HOP: usize = 512;
/// Power floor used for the dB conversion.
const AMIN: f64 = 1e-10;

/// Return the non-silent span of `samples` as a sample index range.
pub fn non_silent_range(samples: &[f32], top_db: f32) -> Range<usize> {
    let power = frame_power(samples);
    let peak = power.iter().copied().fold(0.0f64, f64::max);
    if peak <= AMIN {
        return 0..0;
    }

    let ref_db = 10.0 * peak.log10();
    let threshold = -(top_db as f64);
    let is_loud = |p: f64| 10.0 * p.max(AMIN).log10() - ref_db > threshold;

    let Some(first) = power.iter().position(|&p| is_loud(p)) else {
        return 0..0;
    };
    let last = power.iter().rposition(|&p| is_loud(p)).unwrap_or(first);

    let start = (first * TRIM_HOP).min(samples.len());
    let end = ((last + 1) * TRIM_HOP).min(samples.len());
    start..end
}

/// Trim leading and trailing silence quieter than `top_db` below the peak.
pub fn trim_silence(samples: &[f32], top_db: f32) -> &[f32] {
    &samples[non_silent_range(samples, top_db)]
}

/// Mean power of each centered frame.
fn frame_power(samples: &[f32]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let pad = TRIM_FRAME_LENGTH / 2;
    let n_frames = 1 + samples.len() / TRIM_HOP;

    (0..n_frames)
        .map(|frame| {
            // Frame covers [frame*hop - pad, frame*hop - pad + frame_length)
            // in signal coordinates; out-of-range samples are zeros.
            let lo = (frame * TRIM_HOP).saturating_sub(pad);
            let hi = (frame * TRIM_HOP + TRIM_FRAME_LENGTH - pad).min(samples.len());
            let sum_sq: f64 = samples[lo.min(hi)..hi]
                .iter()
                .map(|&s| (s as f64) * (s as f64))
                .sum();
            sum_sq / TRIM_FRAME_LENGTH as f64
        })
        .collect()
}
