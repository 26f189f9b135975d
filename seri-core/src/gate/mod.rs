//! Speech/music gate.
//!
//! Cheap pre-filter run before feature extraction and inference:
//!
//! 1. Clips shorter than `min_duration_secs` → `Unknown`.
//! 2. Mean spectral flatness below `max_flatness` **and** mean zero-crossing
//!    rate below `max_zero_crossing_rate` → `Speech`.
//! 3. Anything else → `Music`.
//!
//! The thresholds are empirical and ship with the model artifact; retune them
//! only together with a retrained model.

pub mod spectral;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::Waveform;
use crate::classification::GateLabel;
use crate::features::stft::Stft;

use self::spectral::{mean_spectral_flatness, mean_zero_crossing_rate, GATE_FRAME_LENGTH, GATE_HOP};

pub const DEFAULT_MIN_DURATION_SECS: f64 = 0.3;
pub const DEFAULT_MAX_FLATNESS: f32 = 0.25;
pub const DEFAULT_MAX_ZERO_CROSSING_RATE: f32 = 0.1;

/// Gate thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct GateConfig {
    /// Trimmed clips shorter than this are `Unknown`. Default: 0.3 s.
    pub min_duration_secs: f64,
    /// Speech requires mean flatness strictly below this. Default: 0.25.
    pub max_flatness: f32,
    /// Speech requires mean zero-crossing rate strictly below this.
    /// Default: 0.1.
    pub max_zero_crossing_rate: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: DEFAULT_MIN_DURATION_SECS,
            max_flatness: DEFAULT_MAX_FLATNESS,
            max_zero_crossing_rate: DEFAULT_MAX_ZERO_CROSSING_RATE,
        }
    }
}

/// Gate decision plus the statistics it was based on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateReport {
    pub label: GateLabel,
    pub duration_secs: f64,
    /// `None` when the clip was too short to measure.
    pub flatness: Option<f32>,
    pub zero_crossing_rate: Option<f32>,
}

pub struct SpeechMusicGate {
    config: GateConfig,
    stft: Stft,
}

impl SpeechMusicGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            stft: Stft::new(GATE_FRAME_LENGTH, GATE_HOP),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Classify a trimmed waveform.
    pub fn classify(&self, waveform: &Waveform) -> GateLabel {
        self.analyze(waveform).label
    }

    /// Classify a trimmed waveform and return the statistics used.
    pub fn analyze(&self, waveform: &Waveform) -> GateReport {
        let duration_secs = waveform.duration_secs();
        if duration_secs < self.config.min_duration_secs {
            debug!(duration_secs, "gate: clip too short");
            return GateReport {
                label: GateLabel::Unknown,
                duration_secs,
                flatness: None,
                zero_crossing_rate: None,
            };
        }

        let flatness = mean_spectral_flatness(&self.stft, &waveform.samples);
        let zcr = mean_zero_crossing_rate(&waveform.samples);

        let label = if flatness < self.config.max_flatness
            && zcr < self.config.max_zero_crossing_rate
        {
            GateLabel::Speech
        } else {
            GateLabel::Music
        };

        debug!(duration_secs, flatness, zcr, %label, "gate decision");
        GateReport {
            label,
            duration_secs,
            flatness: Some(flatness),
            zero_crossing_rate: Some(zcr),
        }
    }
}

impl Default for SpeechMusicGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}
