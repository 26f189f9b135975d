//! Centered short-time Fourier transform producing power spectra.
//!
//! Frames are taken from the signal zero-padded by `n_fft / 2` on both
//! sides, so frame `t` is centered on sample `t * hop` and a clip of `n`
//! samples yields `1 + n / hop` frames.

use std::sync::Arc;

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

pub struct Stft {
    n_fft: usize,
    hop: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new(n_fft: usize, hop: usize) -> Self {
        Self {
            n_fft,
            hop,
            window: build_hann_window(n_fft),
            fft: FftPlanner::<f32>::new().plan_fft_forward(n_fft),
        }
    }

    /// Number of non-negative frequency bins (`n_fft / 2 + 1`).
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn n_frames(&self, n_samples: usize) -> usize {
        1 + n_samples / self.hop
    }

    /// Power spectrogram `|X|²`, shape `(n_freqs, n_frames)`.
    pub fn power(&self, samples: &[f32]) -> Array2<f32> {
        let n_freqs = self.n_freqs();
        let n_frames = self.n_frames(samples.len());
        let pad = self.n_fft / 2;

        let mut spec = Array2::<f32>::zeros((n_freqs, n_frames));
        let mut fft_buf = vec![Complex::new(0.0f32, 0.0); self.n_fft];

        for frame in 0..n_frames {
            let origin = (frame * self.hop) as isize - pad as isize;
            for (i, v) in fft_buf.iter_mut().enumerate() {
                let idx = origin + i as isize;
                let s = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize]
                } else {
                    0.0
                };
                *v = Complex::new(s * self.window[i], 0.0);
            }
            self.fft.process(&mut fft_buf);

            for k in 0..n_freqs {
                spec[[k, frame]] = fft_buf[k].norm_sqr();
            }
        }
        spec
    }
}

/// Periodic Hann window.
pub fn build_hann_window(n: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos()))
        .collect()
}
