//! Run-scoped catalog cache
//!
//! Holds everything the catalog told us during one run: resolved entities, season
//! listings per show and per-episode runtimes, plus the per-kind sets of keys the
//! catalog did not know. Entries are written once per key and read by every worker.
//!
//! Nothing is persisted; the cache is dropped with the run.

use super::catalog_client::CatalogClient;
use super::deduplicator::DistinctKeys;
use crate::models::{CatalogEntity, MediaKind, SeasonSummary};
use dashmap::{DashMap, DashSet};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Write-once store of catalog answers for one run
#[derive(Default)]
pub struct CatalogCache {
    entities: DashMap<(MediaKind, String), Arc<CatalogEntity>>,
    /// Keyed by the series name from the export, not the catalog title
    seasons: DashMap<String, Arc<Vec<SeasonSummary>>>,
    episode_runtimes: DashMap<String, Option<u32>>,
    shows_not_found: DashSet<String>,
    movies_not_found: DashSet<String>,
    /// Catalog round-trips issued through this cache
    requests: AtomicUsize,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every distinct key with one catalog lookup each
    ///
    /// **Algorithm:**
    /// 1. Skip keys already resolved or already known missing
    /// 2. Look up the remaining keys with at most `concurrency` requests in flight
    /// 3. Store hits in the entity map, misses in the not-found set of their kind
    ///
    /// Stops issuing new lookups once `cancel_token` fires.
    pub async fn resolve_all(
        &self,
        client: &dyn CatalogClient,
        keys: &DistinctKeys,
        concurrency: usize,
        cancel_token: &CancellationToken,
    ) {
        let pending: Vec<(MediaKind, &str)> = keys
            .iter()
            .filter(|(kind, key)| !self.is_known(*kind, key))
            .collect();

        tracing::info!(
            catalog = client.name(),
            lookups = pending.len(),
            concurrency,
            "Resolving catalog entities"
        );

        stream::iter(pending)
            .map(|(kind, key)| async move {
                if cancel_token.is_cancelled() {
                    return;
                }
                self.requests.fetch_add(1, Ordering::Relaxed);

                match client.find_entity(key, kind).await {
                    Some(entity) => {
                        tracing::debug!(
                            key = %key,
                            kind = %kind,
                            catalog_title = %entity.title,
                            catalog_id = entity.catalog_id,
                            "Catalog entity resolved"
                        );
                        self.insert_entity(kind, key, entity);
                    }
                    None => {
                        tracing::warn!(key = %key, kind = %kind, "Not found in catalog");
                        self.mark_not_found(kind, key);
                    }
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect::<Vec<()>>()
            .await;
    }

    /// Download the season listing of every resolved show
    pub async fn load_seasons(
        &self,
        client: &dyn CatalogClient,
        concurrency: usize,
        cancel_token: &CancellationToken,
    ) {
        let shows: Vec<(String, Arc<CatalogEntity>)> = self
            .entities
            .iter()
            .filter(|entry| entry.key().0 == MediaKind::Show)
            .filter(|entry| !self.seasons.contains_key(&entry.key().1))
            .map(|entry| (entry.key().1.clone(), Arc::clone(entry.value())))
            .collect();

        tracing::info!(shows = shows.len(), "Downloading season listings");

        stream::iter(shows)
            .map(|(series, show)| async move {
                if cancel_token.is_cancelled() {
                    return;
                }
                self.requests.fetch_add(1, Ordering::Relaxed);

                let seasons = client.fetch_seasons(&show).await;
                tracing::debug!(
                    series = %series,
                    seasons = seasons.len(),
                    "Season listing downloaded"
                );
                self.insert_seasons(&series, seasons);
            })
            .buffer_unordered(concurrency.max(1))
            .collect::<Vec<()>>()
            .await;
    }

    /// Runtime of one catalog episode, fetched on first use
    ///
    /// Two workers racing on the same episode may both hit the catalog; the first
    /// answer stored wins.
    pub async fn episode_runtime(&self, client: &dyn CatalogClient, external_id: &str) -> Option<u32> {
        if let Some(cached) = self.episode_runtimes.get(external_id) {
            return *cached;
        }

        self.requests.fetch_add(1, Ordering::Relaxed);
        let runtime = client.fetch_episode_runtime(external_id).await;

        *self
            .episode_runtimes
            .entry(external_id.to_string())
            .or_insert(runtime)
    }

    pub fn insert_entity(&self, kind: MediaKind, key: &str, entity: CatalogEntity) {
        self.entities
            .entry((kind, key.to_string()))
            .or_insert_with(|| Arc::new(entity));
    }

    pub fn insert_seasons(&self, series: &str, seasons: Vec<SeasonSummary>) {
        self.seasons
            .entry(series.to_string())
            .or_insert_with(|| Arc::new(seasons));
    }

    pub fn mark_not_found(&self, kind: MediaKind, key: &str) {
        match kind {
            MediaKind::Show => self.shows_not_found.insert(key.to_string()),
            MediaKind::Movie => self.movies_not_found.insert(key.to_string()),
        };
    }

    pub fn entity(&self, kind: MediaKind, key: &str) -> Option<Arc<CatalogEntity>> {
        self.entities
            .get(&(kind, key.to_string()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Season listing of a show, empty when none was downloaded
    pub fn seasons(&self, series: &str) -> Arc<Vec<SeasonSummary>> {
        self.seasons
            .get(series)
            .map(|entry| Arc::clone(entry.value()))
            .unwrap_or_default()
    }

    pub fn is_not_found(&self, kind: MediaKind, key: &str) -> bool {
        match kind {
            MediaKind::Show => self.shows_not_found.contains(key),
            MediaKind::Movie => self.movies_not_found.contains(key),
        }
    }

    pub fn not_found_count(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Show => self.shows_not_found.len(),
            MediaKind::Movie => self.movies_not_found.len(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    fn is_known(&self, kind: MediaKind, key: &str) -> bool {
        self.is_not_found(kind, key) || self.entities.contains_key(&(kind, key.to_string()))
    }
}
