//! Request-level errors and their HTTP mapping.
//!
//! Every fault raised while serving `/predict` ends up here; this is the only
//! place that decides status codes and error body shapes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::validation::FieldError;
use crate::model::ModelError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid input ({} field error(s))", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Model prediction failed: {0}")]
    ModelInvocation(ModelError),
}

/// JSON error body: `{"error": ..., "details": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelInvocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Unauthorized => ErrorBody {
                error: "Unauthorized",
                details: None,
            },
            ApiError::Validation(errors) => ErrorBody {
                error: "Invalid input",
                details: Some(serde_json::to_value(errors).unwrap_or(Value::Null)),
            },
            ApiError::ModelInvocation(e) => ErrorBody {
                error: "Model prediction failed",
                details: Some(Value::String(e.to_string())),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
