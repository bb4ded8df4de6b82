//! Inference orchestration.
//!
//! - [`engine`]: runs the loaded model off the async reactor

pub mod engine;
