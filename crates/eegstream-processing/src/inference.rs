//! Inference model seam and lifecycle adapter
//!
//! The engine talks to scoring models through [`InferenceModel`]; the
//! [`InferenceAdapter`] enforces the prepare/predict/release lifecycle and
//! guarantees release on every exit path via Drop.

use eegstream_core::{StreamError, StreamResult};

/// External scoring model, consumed only through prepare/predict/release
pub trait InferenceModel: Send {
    /// Model identifier for logging
    fn name(&self) -> &str;

    /// Acquire model resources
    fn prepare(&mut self) -> StreamResult<()>;

    /// Score one feature vector. Must not mutate the features and must be
    /// deterministic given identical inputs and model state.
    fn predict(&self, features: &[f32]) -> StreamResult<Vec<f32>>;

    /// Free model resources
    fn release(&mut self) -> StreamResult<()>;
}

/// Lifecycle guard around an [`InferenceModel`].
///
/// prepare twice without a release fails with `AlreadyPrepared`; predict
/// before prepare or after release fails with `NotPrepared`. Dropping a
/// still-prepared adapter releases the model.
pub struct InferenceAdapter {
    model: Box<dyn InferenceModel>,
    prepared: bool,
}

impl InferenceAdapter {
    pub fn new(model: Box<dyn InferenceModel>) -> Self {
        InferenceAdapter { model, prepared: false }
    }

    /// Name of the wrapped model
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn prepare(&mut self) -> StreamResult<()> {
        if self.prepared {
            return Err(StreamError::AlreadyPrepared);
        }
        self.model.prepare()?;
        self.prepared = true;
        Ok(())
    }

    pub fn predict(&self, features: &[f32]) -> StreamResult<Vec<f32>> {
        if !self.prepared {
            return Err(StreamError::NotPrepared);
        }
        self.model.predict(features)
    }

    pub fn release(&mut self) -> StreamResult<()> {
        if !self.prepared {
            return Err(StreamError::NotPrepared);
        }
        self.model.release()?;
        self.prepared = false;
        Ok(())
    }
}

impl Drop for InferenceAdapter {
    fn drop(&mut self) {
        if self.prepared {
            let _ = self.model.release();
        }
    }
}

/// Logistic regression over band-power features.
///
/// The stand-in for externally trained classifiers: a weighted sum of the
/// feature vector through a sigmoid, scores in (0, 1).
#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: Vec<f32>,
    bias: f32,
}

impl LogisticModel {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        LogisticModel { weights, bias }
    }

    /// Preset over the five standard bands (delta, theta, alpha, beta,
    /// gamma): slow and alpha rhythms raise the score, fast activity
    /// lowers it.
    pub fn relaxation() -> Self {
        LogisticModel {
            weights: vec![-0.5, 0.6, 1.2, -1.0, -0.4],
            bias: 0.0,
        }
    }
}

impl InferenceModel for LogisticModel {
    fn name(&self) -> &str {
        "logistic"
    }

    fn prepare(&mut self) -> StreamResult<()> {
        if self.weights.is_empty() {
            return Err(StreamError::InvalidSignalConfig {
                message: "logistic model has no weights".to_string(),
            });
        }
        Ok(())
    }

    fn predict(&self, features: &[f32]) -> StreamResult<Vec<f32>> {
        if features.len() != self.weights.len() {
            return Err(StreamError::InvalidSignalData {
                reason: format!(
                    "feature vector length {} does not match {} weights",
                    features.len(),
                    self.weights.len()
                ),
            });
        }

        let z: f32 = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias;

        Ok(vec![1.0 / (1.0 + (-z).exp())])
    }

    fn release(&mut self) -> StreamResult<()> {
        Ok(())
    }
}
