//! Error types for viewlog-analyzer
//!
//! Only run-level failures live here. Per-record problems (unparseable lines,
//! catalog misses, failed lookups) are logged and counted, never raised.

use thiserror::Error;

/// Run-level error
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Viewing history file missing or unreadable
    #[error("Input error: {0}")]
    Input(String),

    /// Output files could not be created or written
    #[error("Output error: {0}")]
    Output(#[source] std::io::Error),

    /// Catalog client could not be constructed
    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::services::CatalogError),

    /// Background task panicked or was aborted
    #[error("Internal error: {0}")]
    Internal(String),

    /// viewlog-common error
    #[error("Common error: {0}")]
    Common(#[from] viewlog_common::Error),
}

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
