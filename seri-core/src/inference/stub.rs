//! `StubModel`: returns a fixed probability vector without real inference.
//!
//! Stands in for the ONNX backend in tests and counts how often it is
//! invoked, so callers can assert that gated clips never reach the model.

use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array4;
use tracing::debug;

use crate::error::{Result, SeriError};
use crate::features::MODEL_INPUT_SHAPE;
use crate::inference::EmotionModel;

pub struct StubModel {
    probabilities: Vec<f32>,
    calls: AtomicUsize,
}

impl StubModel {
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self {
            probabilities,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `predict` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmotionModel for StubModel {
    fn warm_up(&self) -> Result<()> {
        debug!("StubModel::warm_up — no-op");
        Ok(())
    }

    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if input.shape() != &MODEL_INPUT_SHAPE[..] {
            return Err(SeriError::InputShape {
                expected: MODEL_INPUT_SHAPE.iter().map(|&d| d as i64).collect(),
                actual: input.shape().iter().map(|&d| d as i64).collect(),
            });
        }
        Ok(self.probabilities.clone())
    }

    fn num_classes(&self) -> Option<usize> {
        Some(self.probabilities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_calls_and_echoes_probabilities() {
        let model = StubModel::new(vec![0.2, 0.8]);
        let input = Array4::<f32>::zeros(MODEL_INPUT_SHAPE);
        assert_eq!(model.predict(&input).unwrap(), vec![0.2, 0.8]);
        assert_eq!(model.predict(&input).unwrap(), vec![0.2, 0.8]);
        assert_eq!(model.calls(), 2);
    }

    #[test]
    fn rejects_wrong_geometry() {
        let model = StubModel::new(vec![1.0]);
        let input = Array4::<f32>::zeros((1, 64, 299, 1));
        assert!(matches!(
            model.predict(&input),
            Err(SeriError::InputShape { .. })
        ));
    }
}
