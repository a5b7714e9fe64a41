//! Catalog client trait
//!
//! The reconciliation pipeline only talks to the metadata catalog through this trait.
//! [`TraktClient`](super::TraktClient) is the production implementation; tests plug in
//! an in-memory catalog.
//!
//! Implementations never fail a lookup outward: network errors, bad statuses and
//! malformed payloads are logged and surface as an empty result.

use crate::models::{CatalogEntity, MediaKind, SeasonSummary};
use async_trait::async_trait;

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Search the catalog for a movie or show by name
    ///
    /// Returns the best hit, or `None` when nothing matched or the request failed.
    async fn find_entity(&self, name: &str, kind: MediaKind) -> Option<CatalogEntity>;

    /// Download every season (with episode titles and ids) of a catalog show
    ///
    /// Empty when the show has no seasons or the request failed.
    async fn fetch_seasons(&self, show: &CatalogEntity) -> Vec<SeasonSummary>;

    /// Runtime in minutes of a single episode
    ///
    /// `None` means the caller should fall back to the show-level average.
    async fn fetch_episode_runtime(&self, external_id: &str) -> Option<u32>;

    /// Short name used in log output
    fn name(&self) -> &'static str {
        "catalog"
    }
}
