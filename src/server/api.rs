//! Inference HTTP API.
//!
//! - GET /          liveness check
//! - POST /predict  bearer-authenticated prediction

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::inference::engine::InferenceEngine;
use crate::model::Prediction;
use crate::server::auth::BearerAuth;
use crate::server::error::ApiError;
use crate::server::validation::{FieldError, PredictionRequest};

/// Application state shared across handlers. Built once, never mutated.
pub struct AppState {
    pub engine: InferenceEngine,
    pub auth: BearerAuth,
}

impl AppState {
    pub fn new(engine: InferenceEngine, auth: BearerAuth) -> Self {
        Self { engine, auth }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route(
            "/predict",
            post(predict).route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_bearer,
            )),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(server.max_body_bytes)),
        )
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// Per-request id attached by the auth layer and carried into handler logs.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Successful prediction.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: Prediction,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "API is live",
    })
}

/// Rejects unauthenticated requests before the body is polled.
async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    state.auth.check(request.headers(), &request_id)?;
    request.extensions_mut().insert(RequestId(request_id));
    Ok(next.run(request).await)
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let request = body
        .map_err(|rejection| vec![FieldError::body_unreadable(rejection.body_text())])
        .and_then(|bytes| PredictionRequest::from_slice(&bytes))
        .map_err(|errors| {
            error!(request_id = request_id, details = ?errors, "Validation error");
            ApiError::Validation(errors)
        })?;

    info!(
        request_id = request_id,
        features = ?request.features(),
        "Received input"
    );

    let prediction = state
        .engine
        .predict(request.into_features())
        .await
        .map_err(|e| {
            error!(request_id = request_id, error = ?e, "Model prediction failed");
            ApiError::ModelInvocation(e)
        })?;

    info!(
        request_id = request_id,
        prediction = %serde_json::to_string(&prediction).unwrap_or_default(),
        "Prediction"
    );

    Ok(Json(PredictionResponse { prediction }))
}
