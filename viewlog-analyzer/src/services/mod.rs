//! Business logic services

pub mod catalog_cache;
pub mod catalog_client;
pub mod deduplicator;
pub mod episode_reconciler;
pub mod history_parser;
pub mod output_router;
pub mod reconciliation_orchestrator;
pub mod title_classifier;
pub mod trakt_client;

pub use catalog_cache::CatalogCache;
pub use catalog_client::CatalogClient;
pub use deduplicator::DistinctKeys;
pub use episode_reconciler::{
    EpisodeOutcome, EpisodeReconciler, FallbackReason, RuntimeResolution, DEFAULT_MATCH_THRESHOLD,
};
pub use history_parser::{split_record, HistoryParser, ParsedHistory};
pub use output_router::{OutputRouter, MOVIE_FILE_NAME, SHOW_FILE_NAME, UNKNOWN_FILE_NAME};
pub use reconciliation_orchestrator::{ReconciliationOrchestrator, RunOptions};
pub use title_classifier::TitleClassifier;
pub use trakt_client::{CatalogError, TraktClient};
