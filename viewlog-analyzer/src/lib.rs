//! viewlog-analyzer library interface
//!
//! Classifies viewing history exports into movies and episodes and reconciles them
//! against the Trakt catalog. Exposed as a library for integration testing.

pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{AnalyzerError, AnalyzerResult};
