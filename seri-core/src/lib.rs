//! # seri-core
//!
//! Speech emotion recognition for short audio clips.
//!
//! ## Architecture
//!
//! ```text
//! audio file / bytes → decode → mono 16 kHz → trim silence
//!                                                  │
//!                                        SpeechMusicGate::analyze
//!                                    unknown / music ──► result (no inference)
//!                                                  │ speech
//!                                        FeatureExtractor::extract (64×300)
//!                                                  │
//!                                     EmotionModel::predict (1,64,300,1)
//!                                                  │
//!                                   arg-max → LabelEncoder::decode → result
//! ```
//!
//! The model and the label encoder are built once by the host and injected
//! into `EmotionClassifier`; every request owns its own waveform and features.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod classification;
pub mod classifier;
pub mod error;
pub mod features;
pub mod gate;
pub mod inference;
pub mod labels;

// Convenience re-exports for downstream crates
pub use audio::Waveform;
pub use classification::{ClassificationResult, GateLabel};
pub use classifier::{ClassifierConfig, EmotionClassifier};
pub use error::SeriError;
pub use features::FeatureExtractor;
pub use gate::{GateConfig, GateReport, SpeechMusicGate};
pub use inference::{EmotionModel, ModelHandle};
pub use labels::LabelEncoder;

#[cfg(feature = "onnx")]
pub use inference::{OnnxEmotionModel, OnnxModelConfig};
