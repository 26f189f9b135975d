use thiserror::Error;

/// All errors produced by seri-core.
#[derive(Debug, Error)]
pub enum SeriError {
    #[error("audio load error: {0}")]
    AudioLoad(String),

    #[error("resampler error: {0}")]
    Resample(String),

    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[error("label file not found: {path}")]
    LabelsNotFound { path: std::path::PathBuf },

    #[error("invalid label encoder: {0}")]
    InvalidLabels(String),

    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("input shape {actual:?} does not match model input {expected:?}")]
    InputShape {
        expected: Vec<i64>,
        actual: Vec<i64>,
    },

    #[error("invalid model output: {0}")]
    ModelOutput(String),

    #[error("model reports {model} classes but label encoder has {labels}")]
    LabelMismatch { model: usize, labels: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SeriError>;
