//! Test Helper Utilities
//!
//! Shared utilities for testing viewlog-analyzer: an in-memory catalog and
//! in-memory output streams.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use viewlog_analyzer::models::{CatalogEntity, CatalogEpisode, MediaKind, SeasonSummary};
use viewlog_analyzer::services::{CatalogClient, OutputRouter};

/// In-memory catalog counting every call
#[derive(Default)]
pub struct FakeCatalog {
    entities: HashMap<(MediaKind, String), CatalogEntity>,
    seasons: HashMap<u64, Vec<SeasonSummary>>,
    episode_runtimes: HashMap<String, u32>,
    searches: Mutex<Vec<(MediaKind, String)>>,
    pub season_calls: AtomicUsize,
    pub runtime_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_show(mut self, name: &str, show: CatalogEntity, seasons: Vec<SeasonSummary>) -> Self {
        self.seasons.insert(show.catalog_id, seasons);
        self.entities.insert((MediaKind::Show, name.to_string()), show);
        self
    }

    pub fn with_movie(mut self, name: &str, movie: CatalogEntity) -> Self {
        self.entities.insert((MediaKind::Movie, name.to_string()), movie);
        self
    }

    pub fn with_episode_runtime(mut self, external_id: &str, runtime: u32) -> Self {
        self.episode_runtimes.insert(external_id.to_string(), runtime);
        self
    }

    /// Number of searches issued for one key
    pub fn searches_for(&self, kind: MediaKind, name: &str) -> usize {
        self.searches
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, n)| *k == kind && n == name)
            .count()
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn find_entity(&self, name: &str, kind: MediaKind) -> Option<CatalogEntity> {
        self.searches.lock().unwrap().push((kind, name.to_string()));
        self.entities.get(&(kind, name.to_string())).cloned()
    }

    async fn fetch_seasons(&self, show: &CatalogEntity) -> Vec<SeasonSummary> {
        self.season_calls.fetch_add(1, Ordering::SeqCst);
        self.seasons.get(&show.catalog_id).cloned().unwrap_or_default()
    }

    async fn fetch_episode_runtime(&self, external_id: &str) -> Option<u32> {
        self.runtime_calls.fetch_add(1, Ordering::SeqCst);
        self.episode_runtimes.get(external_id).copied()
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn show(title: &str, catalog_id: u64, runtime: Option<u32>) -> CatalogEntity {
    CatalogEntity {
        kind: MediaKind::Show,
        title: title.to_string(),
        year: Some(2008),
        catalog_id,
        slug: Some(title.to_lowercase().replace(' ', "-")),
        genres: vec!["drama".to_string(), "crime".to_string()],
        certification: Some("TV-MA".to_string()),
        runtime,
        network: Some("AMC".to_string()),
        first_aired: chrono::DateTime::parse_from_rfc3339("2008-01-21T02:00:00.000Z")
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc)),
        released: None,
    }
}

pub fn movie(title: &str, catalog_id: u64, runtime: Option<u32>) -> CatalogEntity {
    CatalogEntity {
        kind: MediaKind::Movie,
        title: title.to_string(),
        year: Some(2016),
        catalog_id,
        slug: None,
        genres: vec!["action".to_string()],
        certification: Some("PG-13".to_string()),
        runtime,
        network: None,
        first_aired: None,
        released: chrono::NaiveDate::from_ymd_opt(2016, 7, 1),
    }
}

pub fn season(number: u32, titles: &[(&str, &str)]) -> SeasonSummary {
    SeasonSummary {
        season_number: number,
        episodes: titles
            .iter()
            .map(|(title, id)| CatalogEpisode {
                title: title.to_string(),
                external_id: id.to_string(),
                runtime: None,
            })
            .collect(),
    }
}

/// Cloneable in-memory writer
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Data rows, header excluded
    pub fn rows(&self) -> Vec<String> {
        self.lines().into_iter().skip(1).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Output router over three in-memory buffers
pub struct MemoryOutput {
    pub router: OutputRouter,
    pub movies: SharedBuffer,
    pub shows: SharedBuffer,
    pub unknown: SharedBuffer,
}

pub fn memory_output() -> MemoryOutput {
    let movies = SharedBuffer::default();
    let shows = SharedBuffer::default();
    let unknown = SharedBuffer::default();
    let router = OutputRouter::from_writers(
        Box::new(movies.clone()),
        Box::new(shows.clone()),
        Box::new(unknown.clone()),
        ";",
    )
    .unwrap();

    MemoryOutput {
        router,
        movies,
        shows,
        unknown,
    }
}
