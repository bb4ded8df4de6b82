//! ONNX graphs executed with tract.
//!
//! The graph is optimized once at load time for a fixed `1 × n_features`
//! `f32` input. Its first output is returned as the prediction.

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView2};
use tract_onnx::prelude::*;

use super::artifact::ModelLoadError;
use super::{Model, ModelError, Prediction};

pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    n_features: usize,
}

impl OnnxModel {
    pub fn load(path: &Path, n_features: usize) -> Result<Self, ModelLoadError> {
        let invalid = |stage: &str, e: TractError| ModelLoadError::Invalid(format!("{stage}: {e:#}"));

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| invalid("failed to read ONNX graph", e))?
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .map_err(|e| invalid("failed to set input shape", e))?
            .into_optimized()
            .map_err(|e| invalid("failed to optimize ONNX graph", e))?
            .into_runnable()
            .map_err(|e| invalid("failed to make ONNX graph runnable", e))?;

        Ok(Self { plan, n_features })
    }
}

impl Model for OnnxModel {
    fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Prediction, ModelError> {
        if input.ncols() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features,
                got: input.ncols(),
            });
        }
        let backend = |e: TractError| ModelError::Backend(format!("{e:#}"));

        let values: Vec<f32> = input.iter().map(|v| *v as f32).collect();
        let tensor = tract_ndarray::Array2::from_shape_vec((input.nrows(), self.n_features), values)
            .map_err(|e| ModelError::Backend(e.to_string()))?
            .into_tensor();

        let outputs = self.plan.run(tvec!(tensor.into())).map_err(backend)?;
        let first = outputs
            .first()
            .ok_or_else(|| ModelError::Backend("graph produced no outputs".to_string()))?;
        let view = first.to_array_view::<f32>().map_err(backend)?;

        let shape = view.shape().to_vec();
        let data: Vec<f64> = view.iter().map(|v| f64::from(*v)).collect();
        match shape.as_slice() {
            [] | [_] => Ok(Prediction::Vector(Array1::from(data))),
            [rows, cols] => Array2::from_shape_vec((*rows, *cols), data)
                .map(Prediction::Matrix)
                .map_err(|e| ModelError::Backend(e.to_string())),
            other => Err(ModelError::Backend(format!(
                "unsupported output rank {}",
                other.len()
            ))),
        }
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
