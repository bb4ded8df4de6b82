//! Inference engine: turns a validated feature vector into a prediction.
//!
//! The engine owns the process-wide model. Each call builds a single-row
//! `1 × F` input, runs the model to completion on a blocking worker thread
//! and checks that the output can be represented in JSON.

use std::sync::Arc;

use ndarray::{Array2, Axis};
use tracing::debug;

use crate::model::{Model, ModelError, Prediction};

/// The inference engine.
#[derive(Clone)]
pub struct InferenceEngine {
    model: Arc<dyn Model>,
}

impl InferenceEngine {
    /// Create an engine around an already-loaded model.
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self { model }
    }

    /// Predict for one feature vector.
    ///
    /// A panic inside the model is reported as [`ModelError::Worker`] instead
    /// of tearing down the connection.
    pub async fn predict(&self, features: Vec<f64>) -> Result<Prediction, ModelError> {
        let model = self.model.clone();
        let n_features = features.len();

        let joined = tokio::task::spawn_blocking(move || -> Result<Prediction, ModelError> {
            let input = single_row(features);
            let prediction = model.predict(input.view())?;
            prediction.ensure_finite()?;
            Ok(prediction)
        })
        .await;

        let prediction = joined.map_err(|e| ModelError::Worker(e.to_string()))??;
        debug!(n_features, outputs = prediction.len(), "Inference complete");
        Ok(prediction)
    }
}

/// Shape a feature vector as a `1 × F` matrix.
pub fn single_row(features: Vec<f64>) -> Array2<f64> {
    ndarray::Array1::from(features).insert_axis(Axis(0))
}

#[cfg(test)]
mod tests {
    use ndarray::{array, ArrayView2};

    use super::*;

    /// Echoes the input row back and records its shape.
    struct EchoModel;

    impl Model for EchoModel {
        fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Prediction, ModelError> {
            Ok(Prediction::Matrix(input.to_owned()))
        }

        fn n_features(&self) -> usize {
            3
        }

        fn kind(&self) -> &'static str {
            "echo"
        }
    }

    struct PanickingModel;

    impl Model for PanickingModel {
        fn predict(&self, _input: ArrayView2<'_, f64>) -> Result<Prediction, ModelError> {
            panic!("numeric kernel exploded");
        }

        fn n_features(&self) -> usize {
            1
        }

        fn kind(&self) -> &'static str {
            "panicking"
        }
    }

    struct NanModel;

    impl Model for NanModel {
        fn predict(&self, _input: ArrayView2<'_, f64>) -> Result<Prediction, ModelError> {
            Ok(Prediction::Vector(array![f64::NAN]))
        }

        fn n_features(&self) -> usize {
            1
        }

        fn kind(&self) -> &'static str {
            "nan"
        }
    }

    #[test]
    fn test_single_row_shape() {
        let row = single_row(vec![1.0, 2.0, 3.0]);
        assert_eq!(row.shape(), &[1, 3]);
        assert_eq!(row, array![[1.0, 2.0, 3.0]]);
    }

    #[tokio::test]
    async fn test_model_sees_one_row_in_order() {
        let engine = InferenceEngine::new(Arc::new(EchoModel));
        let out = engine.predict(vec![3.0, 1.0, 2.0]).await.unwrap();
        assert_eq!(out, Prediction::Matrix(array![[3.0, 1.0, 2.0]]));
    }

    #[tokio::test]
    async fn test_panic_becomes_worker_error() {
        let engine = InferenceEngine::new(Arc::new(PanickingModel));
        let err = engine.predict(vec![1.0]).await.unwrap_err();
        assert!(matches!(err, ModelError::Worker(_)));
    }

    #[tokio::test]
    async fn test_non_finite_output_rejected() {
        let engine = InferenceEngine::new(Arc::new(NanModel));
        let err = engine.predict(vec![1.0]).await.unwrap_err();
        assert_eq!(err, ModelError::NonFinite(0));
    }
}
