//! `EmotionClassifier`: gate → features → model → label.
//!
//! ## Request flow
//!
//! ```text
//! classify_file / classify_bytes
//!     └─► load (mono, 16 kHz) → trim silence
//!         └─► classify_waveform
//!               ├─► gate: unknown | music → { gate, null, null }   (model untouched)
//!               └─► speech → log-mel (64×300) → (1,64,300,1) → predict
//!                         └─► arg-max → label decode → { speech, emotion, confidence }
//! ```
//!
//! ## Threading
//!
//! `EmotionClassifier` is `Send + Sync`. The model handle and label encoder
//! are read-only after construction; wrap the classifier in an `Arc` and call
//! it from as many worker threads as needed. Each call owns its waveform and
//! feature matrix.

pub mod decode;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    audio::{self, Waveform, DEFAULT_TOP_DB, TARGET_SAMPLE_RATE},
    classification::ClassificationResult,
    error::{Result, SeriError},
    features::{to_model_input, FeatureExtractor},
    gate::{GateConfig, SpeechMusicGate},
    inference::ModelHandle,
    labels::LabelEncoder,
};

/// Configuration for `EmotionClassifier`.
///
/// Defaults match the shipped model; change them only together with the
/// model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ClassifierConfig {
    /// Analysis sample rate (Hz). Default: 16000.
    pub target_sample_rate: u32,
    /// Edge-trim threshold in dB below peak. Default: 30.
    pub trim_top_db: f32,
    pub gate: GateConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: TARGET_SAMPLE_RATE,
            trim_top_db: DEFAULT_TOP_DB,
            gate: GateConfig::default(),
        }
    }
}

pub struct EmotionClassifier {
    config: ClassifierConfig,
    gate: SpeechMusicGate,
    extractor: FeatureExtractor,
    model: ModelHandle,
    labels: Arc<LabelEncoder>,
}

impl EmotionClassifier {
    pub fn new(config: ClassifierConfig, model: ModelHandle, labels: Arc<LabelEncoder>) -> Self {
        Self {
            gate: SpeechMusicGate::new(config.gate.clone()),
            extractor: FeatureExtractor::new(config.target_sample_rate),
            config,
            model,
            labels,
        }
    }

    /// Warm the model up and check it agrees with the label encoder.
    ///
    /// Call once at startup; an error here means the process must not serve.
    pub fn warm_up(&self) -> Result<()> {
        if let Some(model_classes) = self.model.num_classes() {
            if model_classes != self.labels.len() {
                return Err(SeriError::LabelMismatch {
                    model: model_classes,
                    labels: self.labels.len(),
                });
            }
        }
        info!(classes = self.labels.len(), "warming up emotion model");
        self.model.warm_up()?;
        info!("emotion model ready");
        Ok(())
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    /// Classify an audio file on disk.
    pub fn classify_file(&self, path: &Path) -> Result<ClassificationResult> {
        let waveform = audio::load_file(path, self.config.target_sample_rate)?;
        self.classify_loaded(waveform)
    }

    /// Classify an in-memory audio file (e.g. an upload body).
    pub fn classify_bytes(
        &self,
        bytes: &[u8],
        extension: Option<&str>,
    ) -> Result<ClassificationResult> {
        let waveform = audio::load_bytes(bytes, extension, self.config.target_sample_rate)?;
        self.classify_loaded(waveform)
    }

    fn classify_loaded(&self, waveform: Waveform) -> Result<ClassificationResult> {
        let trimmed = waveform.trimmed(self.config.trim_top_db);
        debug!(
            loaded_secs = waveform.duration_secs(),
            trimmed_secs = trimmed.duration_secs(),
            "silence trimmed"
        );
        self.classify_waveform(&trimmed)
    }

    /// Classify a waveform that is already mono, at the target rate and
    /// trimmed.
    pub fn classify_waveform(&self, waveform: &Waveform) -> Result<ClassificationResult> {
        if waveform.sample_rate != self.config.target_sample_rate {
            return Err(SeriError::AudioLoad(format!(
                "waveform at {} Hz, classifier expects {} Hz",
                waveform.sample_rate, self.config.target_sample_rate
            )));
        }

        let gate = self.gate.analyze(waveform);
        if !gate.label.is_speech() {
            return Ok(ClassificationResult::gated(gate.label));
        }

        let started = Instant::now();
        let features = self.extractor.extract(&waveform.samples);
        let input = to_model_input(features);
        let probabilities = self.model.predict(&input)?;

        if probabilities.len() != self.labels.len() {
            return Err(SeriError::LabelMismatch {
                model: probabilities.len(),
                labels: self.labels.len(),
            });
        }
        let (index, confidence) = decode::argmax(&probabilities)?;
        // Reported as-is, so it must already be a probability.
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SeriError::ModelOutput(format!(
                "top score {confidence} outside [0, 1]; model must emit probabilities"
            )));
        }
        let emotion = self.labels.decode(index).ok_or_else(|| {
            SeriError::ModelOutput(format!("class index {index} has no label"))
        })?;

        debug!(
            emotion,
            confidence,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "emotion classified"
        );
        Ok(ClassificationResult::speech(emotion, confidence))
    }
}

impl std::fmt::Debug for EmotionClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionClassifier")
            .field("config", &self.config)
            .field("classes", &self.labels.len())
            .finish_non_exhaustive()
    }
}
