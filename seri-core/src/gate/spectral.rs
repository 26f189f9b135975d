//! Clip-level statistics used by the speech/music gate.
//!
//! Both statistics are computed per frame (2048 samples, hop 512, centered)
//! and averaged over the clip.

use crate::features::stft::Stft;

pub const GATE_FRAME_LENGTH: usize = 2048;
pub const GATE_HOP: usize = 512;
/// Power floor for the flatness means.
const FLATNESS_AMIN: f64 = 1e-10;
/// Amplitudes at or below this count as zero for crossing detection.
const ZCR_THRESHOLD: f32 = 1e-10;

/// Mean spectral flatness: geometric over arithmetic mean of the power
/// spectrum. Near 0 for tonal frames, near 1 for white noise.
pub fn mean_spectral_flatness(stft: &Stft, samples: &[f32]) -> f32 {
    let power = stft.power(samples);
    let n_freqs = power.nrows() as f64;

    let per_frame: Vec<f64> = power
        .columns()
        .into_iter()
        .map(|column| {
            let mut log_sum = 0.0f64;
            let mut sum = 0.0f64;
            for &p in column {
                let p = (p as f64).max(FLATNESS_AMIN);
                log_sum += p.ln();
                sum += p;
            }
            let gmean = (log_sum / n_freqs).exp();
            let amean = sum / n_freqs;
            gmean / amean
        })
        .collect();

    mean(&per_frame) as f32
}

/// Mean zero-crossing rate: sign changes per sample within each frame.
///
/// Frames are edge-padded at the clip boundaries. Zero counts as positive.
pub fn mean_zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let pad = GATE_FRAME_LENGTH / 2;
    let n_frames = 1 + samples.len() / GATE_HOP;
    let last = samples.len() - 1;
    let is_negative = |idx: isize| {
        let clamped = idx.clamp(0, last as isize) as usize;
        samples[clamped] < -ZCR_THRESHOLD
    };

    let per_frame: Vec<f64> = (0..n_frames)
        .map(|frame| {
            let origin = (frame * GATE_HOP) as isize - pad as isize;
            let mut prev = is_negative(origin);
            let mut crossings = 0usize;
            for i in 1..GATE_FRAME_LENGTH as isize {
                let cur = is_negative(origin + i);
                if cur != prev {
                    crossings += 1;
                }
                prev = cur;
            }
            crossings as f64 / GATE_FRAME_LENGTH as f64
        })
        .collect();

    mean(&per_frame) as f32
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / 16_000.0).sin())
            .collect()
    }

    fn white_noise(len: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen_range(-0.5f32..0.5)).collect()
    }

    #[test]
    fn zcr_of_sine_is_twice_its_frequency() {
        // 400 Hz at 16 kHz → 800 crossings/s → 0.05 per sample.
        let zcr = mean_zero_crossing_rate(&sine(400.0, 32_000));
        assert_abs_diff_eq!(zcr, 0.05, epsilon = 0.003);
    }

    #[test]
    fn zcr_of_alternating_signal_is_near_one() {
        let samples: Vec<f32> = (0..32_768)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        assert!(mean_zero_crossing_rate(&samples) > 0.9);
    }

    #[test]
    fn zcr_ignores_sub_threshold_wiggle() {
        let samples: Vec<f32> = (0..8_192)
            .map(|i| if i % 2 == 0 { 1e-12 } else { -1e-12 })
            .collect();
        assert_eq!(mean_zero_crossing_rate(&samples), 0.0);
    }

    #[test]
    fn flatness_separates_tone_from_noise() {
        let stft = Stft::new(GATE_FRAME_LENGTH, GATE_HOP);
        let tone = mean_spectral_flatness(&stft, &sine(220.0, 32_000));
        let noise = mean_spectral_flatness(&stft, &white_noise(32_000, 7));
        assert!(tone < 0.05, "tone flatness={tone}");
        assert!(noise > 0.4, "noise flatness={noise}");
    }

    #[test]
    fn flatness_of_silence_is_one() {
        let stft = Stft::new(GATE_FRAME_LENGTH, GATE_HOP);
        let flat = mean_spectral_flatness(&stft, &vec![0.0; 4_096]);
        assert_abs_diff_eq!(flat, 1.0, epsilon = 1e-6);
    }
}
