//! Pre-trained model backends.
//!
//! - [`artifact`]: loading a model artifact from disk
//! - [`linear`]: linear and logistic regression models
//! - [`onnx`]: ONNX graphs via tract (behind the `onnx` feature)

pub mod artifact;
pub mod linear;
#[cfg(feature = "onnx")]
pub mod onnx;

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Serialize, Serializer};
use thiserror::Error;

pub use artifact::{load_model, ModelArtifact, ModelLoadError};

/// Failure while running a loaded model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("X has {got} features, but the model expects {expected} features")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Model produced a non-finite value at position {0}")]
    NonFinite(usize),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Inference worker failed: {0}")]
    Worker(String),
}

/// A loaded, immutable model.
///
/// `predict` takes an `n_rows × n_features` matrix and returns one output per
/// row. One instance serves every request for the life of the process.
pub trait Model: Send + Sync {
    fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Prediction, ModelError>;

    /// Number of input features expected per row.
    fn n_features(&self) -> usize;

    /// Short backend name used in logs.
    fn kind(&self) -> &'static str;
}

/// Raw model output: one value per row, or one row of values per input row.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Vector(Array1<f64>),
    Matrix(Array2<f64>),
}

impl Prediction {
    /// Number of output rows.
    pub fn len(&self) -> usize {
        match self {
            Prediction::Vector(v) => v.len(),
            Prediction::Matrix(m) => m.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON cannot carry NaN or infinity, so those are reported as a model fault.
    pub fn ensure_finite(&self) -> Result<(), ModelError> {
        let bad = match self {
            Prediction::Vector(v) => v.iter().position(|x| !x.is_finite()),
            Prediction::Matrix(m) => m.iter().position(|x| !x.is_finite()),
        };
        match bad {
            Some(pos) => Err(ModelError::NonFinite(pos)),
            None => Ok(()),
        }
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Prediction::Vector(v) => serializer.collect_seq(v.iter()),
            Prediction::Matrix(m) => serializer.collect_seq(m.outer_iter().map(|row| row.to_vec())),
        }
    }
}
