//! Catalog-side entities
//!
//! Produced by a [`CatalogClient`](crate::services::CatalogClient) and only read by
//! the rest of the pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of catalog entity a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movie or show as known to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntity {
    pub kind: MediaKind,
    /// Canonical title
    pub title: String,
    pub year: Option<u32>,
    /// Numeric catalog id
    pub catalog_id: u64,
    /// URL-safe catalog id, used for season downloads
    pub slug: Option<String>,
    pub genres: Vec<String>,
    pub certification: Option<String>,
    /// Movie runtime, or the show-level average episode runtime (minutes)
    pub runtime: Option<u32>,
    /// Shows only
    pub network: Option<String>,
    /// Shows only
    pub first_aired: Option<DateTime<Utc>>,
    /// Movies only
    pub released: Option<NaiveDate>,
}

/// Episode entry inside a [`SeasonSummary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEpisode {
    pub title: String,
    /// Id used to fetch per-episode details
    pub external_id: String,
    /// Runtime in minutes when the season listing already carries it
    pub runtime: Option<u32>,
}

/// All episodes of one season of a catalog show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    /// In catalog order
    pub episodes: Vec<CatalogEpisode>,
}

/// Closest catalog episode for a locally parsed episode title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub episode: CatalogEpisode,
    /// Levenshtein distance between the parsed title and `episode.title`
    pub distance: usize,
}

impl MatchResult {
    pub fn is_exact(&self) -> bool {
        self.distance == 0
    }
}
