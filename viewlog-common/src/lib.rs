//! # Viewlog Common Library
//!
//! Shared code for the viewlog tools including:
//! - Error types
//! - Configuration loading (TOML + environment)
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
