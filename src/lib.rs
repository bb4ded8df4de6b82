//! model-serve: HTTP inference for a pre-trained model.
//!
//! Loads one model artifact at startup and serves it behind two routes:
//! a liveness check on `GET /` and bearer-token guarded inference on
//! `POST /predict`.

pub mod config;
pub mod inference;
pub mod model;
pub mod server;
pub mod telemetry;
