//! Emotion model abstraction.
//!
//! The `EmotionModel` trait decouples the classifier from any specific
//! inference engine (ONNX Runtime, a test double, …). A model takes the
//! `(1, 64, 300, 1)` log-mel tensor and returns one probability per class.
//!
//! `predict` takes `&self`: implementations are shared read-only across
//! concurrent requests. Engines whose run call needs exclusive access (ONNX
//! Runtime sessions do) serialise that call internally and nothing else.

pub mod stub;

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::{OnnxEmotionModel, OnnxModelConfig};

use std::sync::Arc;

use ndarray::Array4;

use crate::error::Result;

/// Contract for emotion classification backends.
pub trait EmotionModel: Send + Sync + 'static {
    /// One-time warm-up, e.g. a dummy forward pass. Called once at startup.
    ///
    /// # Errors
    /// Returns an error if the model cannot run at all; the host must not
    /// start serving requests in that case.
    fn warm_up(&self) -> Result<()>;

    /// Run the model on one batch of features.
    ///
    /// # Returns
    /// Per-class probabilities for the single item in the batch.
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>>;

    /// Number of classes the model declares, when it declares one.
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

/// Thread-safe reference-counted handle to any `EmotionModel` implementor.
#[derive(Clone)]
pub struct ModelHandle(pub Arc<dyn EmotionModel>);

impl ModelHandle {
    /// Wrap any `EmotionModel` in a `ModelHandle`.
    pub fn new<M: EmotionModel>(model: M) -> Self {
        Self(Arc::new(model))
    }

    pub fn warm_up(&self) -> Result<()> {
        self.0.warm_up()
    }

    pub fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        self.0.predict(input)
    }

    pub fn num_classes(&self) -> Option<usize> {
        self.0.num_classes()
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle").finish_non_exhaustive()
    }
}
