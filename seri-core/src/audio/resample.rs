//! Sample-rate conversion using a rubato `FastFixedIn` resampler.
//!
//! ## Design
//!
//! Decoded files arrive at whatever rate they were recorded at (44.1 kHz and
//! 48 kHz are the usual suspects). The gate and the log-mel frontend assume
//! 16 kHz mono f32. `RateConverter` bridges that gap for a whole clip.
//!
//! When source rate == target rate, `RateConverter` is a passthrough and no
//! rubato session is created at all.
//!
//! ## Usage
//!
//! ```ignore
//! let mut rc = RateConverter::new(44_100, 16_000, 1024)?;
//! rc.push(&samples);
//! let out = rc.finish()?; // Vec<f32> at 16 kHz
//! ```

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::error::{Result, SeriError};

/// Input frames per rubato call when converting whole clips.
pub const DEFAULT_CHUNK: usize = 1024;

/// Converts f32 mono audio from one fixed sample rate to another.
pub struct RateConverter {
    /// `None` when source rate == target rate (passthrough mode).
    resampler: Option<FastFixedIn<f32>>,
    ratio: f64,
    /// Holds input samples that do not yet fill a whole chunk.
    input_buf: Vec<f32>,
    chunk_size: usize,
    /// Pre-allocated output buffer: `[1][output_frames_max]`.
    output_buf: Vec<Vec<f32>>,
    /// Raw resampler output, delay not yet removed.
    produced: Vec<f32>,
    samples_in: usize,
}

impl RateConverter {
    /// Create a new converter.
    ///
    /// # Errors
    /// Returns `SeriError::Resample` if either rate is zero or rubato fails
    /// to initialise.
    pub fn new(source_rate: u32, target_rate: u32, chunk_size: usize) -> Result<Self> {
        if source_rate == 0 || target_rate == 0 {
            return Err(SeriError::Resample(format!(
                "invalid rates: {source_rate} Hz -> {target_rate} Hz"
            )));
        }

        let ratio = target_rate as f64 / source_rate as f64;
        if source_rate == target_rate {
            return Ok(Self {
                resampler: None,
                ratio,
                input_buf: Vec::new(),
                chunk_size,
                output_buf: Vec::new(),
                produced: Vec::new(),
                samples_in: 0,
            });
        }

        let resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0, // fixed ratio, no dynamic adjustment
            PolynomialDegree::Cubic,
            chunk_size,
            1, // mono
        )
        .map_err(|e| SeriError::Resample(format!("resampler init: {e}")))?;

        let max_out = resampler.output_frames_max();
        let output_buf = vec![vec![0f32; max_out]; 1];

        tracing::debug!(source_rate, target_rate, chunk_size, "resampling enabled");

        Ok(Self {
            resampler: Some(resampler),
            ratio,
            input_buf: Vec::new(),
            chunk_size,
            output_buf,
            produced: Vec::new(),
            samples_in: 0,
        })
    }

    /// Feed samples. Whole `chunk_size` blocks are converted immediately; the
    /// remainder waits for the next call or for `finish`.
    pub fn push(&mut self, samples: &[f32]) -> Result<()> {
        self.samples_in += samples.len();
        self.input_buf.extend_from_slice(samples);

        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(());
        };

        let mut offset = 0;
        while self.input_buf.len() - offset >= self.chunk_size {
            let input_slice = &self.input_buf[offset..offset + self.chunk_size];
            let (_consumed, produced) = resampler
                .process_into_buffer(&[input_slice], &mut self.output_buf, None)
                .map_err(|e| SeriError::Resample(e.to_string()))?;
            self.produced
                .extend_from_slice(&self.output_buf[0][..produced]);
            offset += self.chunk_size;
        }
        self.input_buf.drain(..offset);
        Ok(())
    }

    /// Flush buffered input and return the converted clip.
    ///
    /// The resampler's group delay is removed, and the output holds exactly
    /// `round(samples_in * ratio)` samples.
    pub fn finish(mut self) -> Result<Vec<f32>> {
        let Some(mut resampler) = self.resampler.take() else {
            return Ok(self.input_buf);
        };

        let delay = resampler.output_delay();
        let expected = (self.samples_in as f64 * self.ratio).round() as usize;

        if !self.input_buf.is_empty() {
            let (_consumed, produced) = resampler
                .process_partial_into_buffer(
                    Some(&[self.input_buf.as_slice()][..]),
                    &mut self.output_buf,
                    None,
                )
                .map_err(|e| SeriError::Resample(e.to_string()))?;
            self.produced
                .extend_from_slice(&self.output_buf[0][..produced]);
        }

        // Drain the delay line with silence until the tail is out.
        while self.produced.len() < delay + expected {
            let (_consumed, produced) = resampler
                .process_partial_into_buffer(None::<&[&[f32]]>, &mut self.output_buf, None)
                .map_err(|e| SeriError::Resample(e.to_string()))?;
            if produced == 0 {
                break;
            }
            self.produced
                .extend_from_slice(&self.output_buf[0][..produced]);
        }

        let start = delay.min(self.produced.len());
        let end = (delay + expected).min(self.produced.len());
        Ok(self.produced[start..end].to_vec())
    }

    /// Returns `true` when source rate == target rate (no resampling occurs).
    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }
}

/// Convert a whole mono clip in one call.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    let mut rc = RateConverter::new(source_rate, target_rate, DEFAULT_CHUNK)?;
    rc.push(samples)?;
    rc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_identity() {
        let rc = RateConverter::new(16_000, 16_000, DEFAULT_CHUNK).unwrap();
        assert!(rc.is_passthrough());
        let samples: Vec<f32> = (0..480).map(|i| i as f32 * 0.001).collect();
        let out = resample(&samples, 16_000, 16_000).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn ratio_48k_to_16k_exact_length() {
        let samples = vec![0.1f32; 48_000];
        let out = resample(&samples, 48_000, 16_000).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn odd_length_44k1_rounds_output() {
        // 1000 samples at 44.1 kHz → 362.8… → 363 at 16 kHz
        let samples = vec![0.0f32; 1000];
        let out = resample(&samples, 44_100, 16_000).unwrap();
        assert_eq!(out.len(), 363);
    }

    #[test]
    fn partial_push_keeps_remainder() {
        let mut rc = RateConverter::new(48_000, 16_000, DEFAULT_CHUNK).unwrap();
        rc.push(&vec![0.0f32; 500]).unwrap();
        rc.push(&vec![0.0f32; 700]).unwrap();
        let out = rc.finish().unwrap();
        assert_eq!(out.len(), 400);
    }

    #[test]
    fn preserves_dc_level() {
        let samples = vec![0.25f32; 44_100];
        let out = resample(&samples, 44_100, 16_000).unwrap();
        // Skip the edges, where the interpolator sees the implicit zero padding.
        let mid = &out[1_000..out.len() - 1_000];
        assert!(mid.iter().all(|s| (s - 0.25).abs() < 1e-3));
    }

    #[test]
    fn zero_rate_rejected() {
        assert!(matches!(
            RateConverter::new(0, 16_000, DEFAULT_CHUNK),
            Err(SeriError::Resample(_))
        ));
    }
}
