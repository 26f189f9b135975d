//! Result payload handed back to the transport layer.
//!
//! Serialized shape:
//!
//! ```json
//! { "gate": "speech", "emotion": "happy", "confidence": 0.71 }
//! { "gate": "music",  "emotion": null,    "confidence": null }
//! ```

use serde::{Deserialize, Serialize};

/// Outcome of the speech/music gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateLabel {
    /// Clip too short (or silent) to judge.
    Unknown,
    /// Speech-like: low flatness and low zero-crossing rate.
    Speech,
    /// Music or any other non-speech sound.
    Music,
}

impl GateLabel {
    pub fn is_speech(self) -> bool {
        self == GateLabel::Speech
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GateLabel::Unknown => "unknown",
            GateLabel::Speech => "speech",
            GateLabel::Music => "music",
        }
    }
}

impl std::fmt::Display for GateLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final classification of one clip.
///
/// `emotion` and `confidence` are `Some` exactly when `gate` is
/// [`GateLabel::Speech`]; the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub gate: GateLabel,
    pub emotion: Option<String>,
    pub confidence: Option<f32>,
}

impl ClassificationResult {
    /// A clip the gate rejected; no inference ran.
    pub fn gated(gate: GateLabel) -> Self {
        debug_assert!(!gate.is_speech());
        Self {
            gate,
            emotion: None,
            confidence: None,
        }
    }

    pub fn speech(emotion: impl Into<String>, confidence: f32) -> Self {
        Self {
            gate: GateLabel::Speech,
            emotion: Some(emotion.into()),
            confidence: Some(confidence),
        }
    }
}
