//! Emotion CNN backend via the `ort` crate.
//!
//! Targets a single-graph export:
//! - `emotion_cnn_model.onnx` — one input `[1,64,300,1]` f32 (log-mel) →
//!   first output `[1,K]` class probabilities
//! - `labels.json` — class names in index order (see `labels`)
//!
//! `ort::Session::run` needs `&mut Session`, so the session sits behind a
//! `parking_lot::Mutex` that is held for the run call only. Feature
//! extraction for other requests proceeds in parallel.

use std::path::{Path, PathBuf};

use ndarray::Array4;
use ort::session::{Session, SessionInputValue};
use ort::value::Value;
use ort::{
    ep,
    session::builder::{GraphOptimizationLevel, SessionBuilder},
};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{
    error::{Result, SeriError},
    features::MODEL_INPUT_SHAPE,
    inference::EmotionModel,
};

pub const MODEL_FILE: &str = "emotion_cnn_model.onnx";
pub const LABELS_FILE: &str = "labels.json";

// ── Model config ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OnnxModelConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
}

impl Default for OnnxModelConfig {
    fn default() -> Self {
        let dir = selected_models_dir();
        Self {
            model_path: dir.join(MODEL_FILE),
            labels_path: dir.join(LABELS_FILE),
        }
    }
}

fn selected_models_dir() -> PathBuf {
    if let Ok(explicit) = std::env::var("SERI_MODEL_DIR") {
        if !explicit.trim().is_empty() {
            return PathBuf::from(explicit.trim());
        }
    }
    default_models_dir()
}

pub fn default_models_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(|p| PathBuf::from(p).join("seri").join("models"))
            .unwrap_or_else(|| PathBuf::from("models"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("seri")
            .join("models")
    }
}

fn env_threads(name: &str, default: usize, max: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
        .clamp(1, max)
}

fn create_session(model_path: &Path) -> Result<Session> {
    let logical_cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    // Requests already run in parallel; keep each run modest.
    let intra_threads = env_threads("SERI_ORT_INTRA_THREADS", logical_cores.clamp(1, 4), 32);
    let inter_threads = env_threads("SERI_ORT_INTER_THREADS", 1, 8);

    let builder = SessionBuilder::new()
        .map_err(|e| SeriError::OnnxSession(e.to_string()))?
        .with_intra_threads(intra_threads)
        .map_err(|e| SeriError::OnnxSession(e.to_string()))?
        .with_inter_threads(inter_threads)
        .map_err(|e| SeriError::OnnxSession(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::All)
        .map_err(|e| SeriError::OnnxSession(e.to_string()))?
        .with_execution_providers([ep::CPU::default().build()])
        .map_err(|e| SeriError::OnnxSession(e.to_string()))?;
    info!(
        intra_threads,
        inter_threads, logical_cores, "ONNX session threading configured"
    );

    builder
        .commit_from_file(model_path)
        .map_err(|e| SeriError::OnnxSession(e.to_string()))
}

/// Check a declared input shape against the frontend geometry.
/// Non-positive dimensions are symbolic and accepted.
fn check_input_shape(declared: &[i64]) -> Result<()> {
    let expected: Vec<i64> = MODEL_INPUT_SHAPE.iter().map(|&d| d as i64).collect();
    let compatible = declared.len() == expected.len()
        && declared
            .iter()
            .zip(&expected)
            .all(|(&d, &e)| d <= 0 || d == e);
    if compatible {
        Ok(())
    } else {
        Err(SeriError::InputShape {
            expected,
            actual: declared.to_vec(),
        })
    }
}

// ── OnnxEmotionModel ─────────────────────────────────────────────────────────

pub struct OnnxEmotionModel {
    session: Mutex<Session>,
    input_name: String,
    num_classes: Option<usize>,
}

impl OnnxEmotionModel {
    /// Load the session and validate its declared geometry.
    ///
    /// # Errors
    /// `ModelNotFound` if the file is missing, `OnnxSession` if the runtime
    /// rejects it, `InputShape` if its input is not `[1,64,300,1]`.
    pub fn new(config: &OnnxModelConfig) -> Result<Self> {
        let path = &config.model_path;
        info!("=== seri ONNX Model Startup Report ===");
        if !path.exists() {
            info!("  {:?}: NOT FOUND", path);
            return Err(SeriError::ModelNotFound { path: path.clone() });
        }
        let size_mb = std::fs::metadata(path)
            .map(|m| m.len() as f64 / 1_048_576.0)
            .unwrap_or(0.0);
        info!("  {:?}: {:.2} MB", path, size_mb);

        let session = create_session(path)?;

        info!("  inputs:");
        for input in session.inputs().iter() {
            info!("    {}", input.name());
        }
        info!("  outputs:");
        for output in session.outputs().iter() {
            info!("    {}", output.name());
        }

        let input = session
            .inputs()
            .first()
            .ok_or_else(|| SeriError::OnnxSession("model has no inputs".into()))?;
        if session.inputs().len() > 1 {
            warn!(
                inputs = session.inputs().len(),
                "model declares more than one input; feeding the first only"
            );
        }
        let input_name = input.name().to_string();
        if let Some(shape) = input.dtype().tensor_shape() {
            check_input_shape(shape)?;
        }

        let num_classes = session
            .outputs()
            .first()
            .and_then(|o| o.dtype().tensor_shape())
            .and_then(|shape| shape.last().copied())
            .filter(|&d| d > 0)
            .map(|d| d as usize);
        info!(?num_classes, input = %input_name, "=== model loaded ===");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            num_classes,
        })
    }
}

impl EmotionModel for OnnxEmotionModel {
    fn warm_up(&self) -> Result<()> {
        let dummy = Array4::<f32>::zeros(MODEL_INPUT_SHAPE);
        let probs = self.predict(&dummy)?;
        info!(classes = probs.len(), "=== OnnxEmotionModel warm-up complete ===");
        Ok(())
    }

    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        if input.shape() != &MODEL_INPUT_SHAPE[..] {
            return Err(SeriError::InputShape {
                expected: MODEL_INPUT_SHAPE.iter().map(|&d| d as i64).collect(),
                actual: input.shape().iter().map(|&d| d as i64).collect(),
            });
        }

        let value = Value::from_array(input.clone())
            .map_err(|e: ort::Error| SeriError::OnnxSession(e.to_string()))?;
        let inputs: Vec<(String, SessionInputValue<'_>)> =
            vec![(self.input_name.clone(), value.into())];

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| SeriError::OnnxSession(e.to_string()))?;
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| SeriError::OnnxSession(e.to_string()))?;

        // Batch of one: the first row is the whole answer.
        let row = shape
            .last()
            .copied()
            .filter(|&d| d > 0)
            .map(|d| d as usize)
            .unwrap_or(data.len())
            .min(data.len());
        let probabilities = data[..row].to_vec();
        Ok(probabilities)
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_and_symbolic_shapes() {
        assert!(check_input_shape(&[1, 64, 300, 1]).is_ok());
        assert!(check_input_shape(&[-1, 64, 300, 1]).is_ok());
    }

    #[test]
    fn rejects_mismatched_geometry() {
        assert!(matches!(
            check_input_shape(&[1, 80, 3000]),
            Err(SeriError::InputShape { .. })
        ));
        assert!(matches!(
            check_input_shape(&[1, 64, 256, 1]),
            Err(SeriError::InputShape { .. })
        ));
    }

    #[test]
    fn missing_model_file_is_reported() {
        let config = OnnxModelConfig {
            model_path: PathBuf::from("/no/such/emotion_cnn_model.onnx"),
            labels_path: PathBuf::from("/no/such/labels.json"),
        };
        assert!(matches!(
            OnnxEmotionModel::new(&config),
            Err(SeriError::ModelNotFound { .. })
        ));
    }
}
