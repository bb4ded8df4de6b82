//! HTTP server exposing the model.
//!
//! - [`api`]: router, shared state and route handlers
//! - [`auth`]: bearer-token check
//! - [`error`]: error kinds and their HTTP mapping
//! - [`validation`]: `/predict` body validation

pub mod api;
pub mod auth;
pub mod error;
pub mod validation;

pub use api::{build_router, AppState};
