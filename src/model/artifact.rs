//! Model artifact loading.
//!
//! The default artifact is a JSON document tagged by `kind`:
//!
//! ```json
//! {"kind": "linear_regression", "coefficients": [1.0, 1.0, 1.0], "intercept": 0.0}
//! ```
//!
//! Paths ending in `.onnx` are handed to the ONNX backend when the crate is
//! built with the `onnx` feature.

use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, Array2};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::linear::{LinearRegression, LogisticRegression};
use super::Model;
use crate::config::ModelConfig;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Model file not found: {0}")]
    FileNotFound(String),

    #[error("I/O error reading model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    Invalid(String),
}

/// Coefficients given either as one row (single target) or as a matrix.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Coefficients {
    Flat(Vec<f64>),
    Rows(Vec<Vec<f64>>),
}

impl Coefficients {
    fn into_matrix(self) -> Result<Array2<f64>, ModelLoadError> {
        let rows = match self {
            Coefficients::Flat(row) => vec![row],
            Coefficients::Rows(rows) => rows,
        };
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(ModelLoadError::Invalid(
                "coefficient rows have differing lengths".to_string(),
            ));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| ModelLoadError::Invalid(e.to_string()))
    }
}

/// Intercept given as a scalar (broadcast to every target) or per target.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Intercept {
    Scalar(f64),
    PerTarget(Vec<f64>),
}

impl Default for Intercept {
    fn default() -> Self {
        Intercept::Scalar(0.0)
    }
}

impl Intercept {
    fn into_vector(self, n_targets: usize) -> Array1<f64> {
        match self {
            Intercept::Scalar(v) => Array1::from_elem(n_targets, v),
            Intercept::PerTarget(v) => Array1::from(v),
        }
    }
}

/// On-disk model description.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LinearRegression {
        coefficients: Coefficients,
        #[serde(default)]
        intercept: Intercept,
    },
    LogisticRegression {
        coefficients: Coefficients,
        #[serde(default)]
        intercept: Intercept,
        classes: Vec<f64>,
    },
}

impl ModelArtifact {
    /// Parse an artifact from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, ModelLoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate the artifact and build the runnable model.
    pub fn build(self) -> Result<Arc<dyn Model>, ModelLoadError> {
        match self {
            ModelArtifact::LinearRegression {
                coefficients,
                intercept,
            } => {
                let coefficients = coefficients.into_matrix()?;
                let intercept = intercept.into_vector(coefficients.nrows());
                let model = LinearRegression::new(coefficients, intercept)
                    .map_err(ModelLoadError::Invalid)?;
                Ok(Arc::new(model))
            }
            ModelArtifact::LogisticRegression {
                coefficients,
                intercept,
                classes,
            } => {
                let coefficients = coefficients.into_matrix()?;
                let intercept = intercept.into_vector(coefficients.nrows());
                let model = LogisticRegression::new(coefficients, intercept, classes)
                    .map_err(ModelLoadError::Invalid)?;
                Ok(Arc::new(model))
            }
        }
    }
}

/// Load the model named by the configuration.
pub fn load_model(config: &ModelConfig) -> Result<Arc<dyn Model>, ModelLoadError> {
    let path = config.model_path.as_path();
    if !path.exists() {
        return Err(ModelLoadError::FileNotFound(path.display().to_string()));
    }

    let model = if is_onnx(path) {
        load_onnx(path, config.input_features)?
    } else {
        let text = std::fs::read_to_string(path)?;
        ModelArtifact::from_json(&text)?.build()?
    };

    info!(
        path = %path.display(),
        kind = model.kind(),
        features = model.n_features(),
        "Loaded model artifact"
    );

    Ok(model)
}

fn is_onnx(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("onnx"))
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path, input_features: Option<usize>) -> Result<Arc<dyn Model>, ModelLoadError> {
    let n_features = input_features.ok_or_else(|| {
        ModelLoadError::Invalid("ONNX models require model.input_features".to_string())
    })?;
    let model = super::onnx::OnnxModel::load(path, n_features)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path, _input_features: Option<usize>) -> Result<Arc<dyn Model>, ModelLoadError> {
    Err(ModelLoadError::Invalid(format!(
        "{} is an ONNX graph but this build lacks the `onnx` feature",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::model::Prediction;

    #[test]
    fn test_flat_coefficients_default_intercept() {
        let model = ModelArtifact::from_json(
            r#"{"kind": "linear_regression", "coefficients": [1.0, 1.0, 1.0]}"#,
        )
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(model.n_features(), 3);
        assert_eq!(
            model.predict(array![[1.0, 2.5, 3.3]].view()).unwrap(),
            Prediction::Vector(array![6.8])
        );
    }

    #[test]
    fn test_scalar_intercept_broadcast() {
        let model = ModelArtifact::from_json(
            r#"{"kind": "linear_regression", "coefficients": [[1.0], [2.0]], "intercept": 1.0}"#,
        )
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(
            model.predict(array![[2.0]].view()).unwrap(),
            Prediction::Matrix(array![[3.0, 5.0]])
        );
    }

    #[test]
    fn test_ragged_coefficients_rejected() {
        let artifact = ModelArtifact::from_json(
            r#"{"kind": "linear_regression", "coefficients": [[1.0, 2.0], [1.0]]}"#,
        )
        .unwrap();
        assert!(matches!(artifact.build(), Err(ModelLoadError::Invalid(_))));
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let err = ModelArtifact::from_json(r#"{"kind": "random_forest"}"#).unwrap_err();
        assert!(matches!(err, ModelLoadError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let config = ModelConfig {
            model_path: "/nonexistent/model.json".into(),
            input_features: None,
        };
        assert!(matches!(
            load_model(&config),
            Err(ModelLoadError::FileNotFound(_))
        ));
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_onnx_requires_input_features() {
        let config = ModelConfig {
            model_path: concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sum3.onnx").into(),
            input_features: None,
        };
        match load_model(&config) {
            Err(ModelLoadError::Invalid(msg)) => assert!(msg.contains("input_features")),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("ONNX model loaded without an input width"),
        }
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_onnx_loaded_by_extension() {
        let config = ModelConfig {
            model_path: concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sum3.onnx").into(),
            input_features: Some(3),
        };
        let model = match load_model(&config) {
            Ok(model) => model,
            Err(e) => panic!("failed to load fixture: {e}"),
        };
        assert_eq!(model.kind(), "onnx");
        assert_eq!(model.n_features(), 3);
    }

    #[test]
    fn test_onnx_extension_detected() {
        assert!(is_onnx(Path::new("models/net.ONNX")));
        assert!(!is_onnx(Path::new("model.json")));
    }
}
