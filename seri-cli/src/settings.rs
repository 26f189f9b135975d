//! Optional JSON settings file for the `seri` CLI.
//!
//! ```json
//! {
//!   "modelPath": "/opt/seri/emotion_cnn_model.onnx",
//!   "labelsPath": "/opt/seri/labels.json",
//!   "classifier": { "trimTopDb": 30.0, "gate": { "maxFlatness": 0.25 } }
//! }
//! ```
//!
//! Every field is optional; command-line flags win over the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use seri_core::ClassifierConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct CliSettings {
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub classifier: ClassifierConfig,
}

impl CliSettings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
