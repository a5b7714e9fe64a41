//! Data models for the reconciliation run

pub mod catalog;
pub mod run_summary;
pub mod view_record;

pub use catalog::{CatalogEntity, CatalogEpisode, MatchResult, MediaKind, SeasonSummary};
pub use run_summary::{RunStatistics, RunSummary};
pub use view_record::{EpisodeRecord, MovieRecord, ViewRecord};
