//! Class index → emotion name mapping.
//!
//! Exported next to the model as JSON, either a bare array (position = class
//! index, the order of a fitted label encoder's `classes_`) or an object
//! with a `classes` array. Any other extension is read as plain text, one
//! class name per non-empty line.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{Result, SeriError};

/// Immutable, read-only after load; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    Bare(Vec<String>),
    Wrapped { classes: Vec<String> },
}

impl LabelEncoder {
    /// Build from class names in index order.
    ///
    /// # Errors
    /// `InvalidLabels` when the list is empty, or a name is blank or
    /// duplicated.
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(SeriError::InvalidLabels("no classes".into()));
        }
        let mut seen = HashSet::with_capacity(classes.len());
        for name in &classes {
            if name.trim().is_empty() {
                return Err(SeriError::InvalidLabels("blank class name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(SeriError::InvalidLabels(format!("duplicate class {name:?}")));
            }
        }
        Ok(Self { classes })
    }

    /// Load from a `.json` or plain-text label file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SeriError::LabelsNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let encoder = if is_json {
            Self::from_json(&text)?
        } else {
            Self::from_lines(&text)?
        };
        info!(path = ?path, classes = encoder.len(), "label encoder loaded");
        Ok(encoder)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let classes = match serde_json::from_str::<LabelFile>(text)? {
            LabelFile::Bare(classes) | LabelFile::Wrapped { classes } => classes,
        };
        Self::new(classes)
    }

    pub fn from_lines(text: &str) -> Result<Self> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Emotion name for a class index.
    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
