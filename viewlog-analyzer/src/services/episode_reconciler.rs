//! Episode reconciliation
//!
//! Export and catalog rarely spell episode titles identically ("Cat's in the Bag"
//! vs. "...And the Bag's in the River"), so the catalog episode is picked by edit
//! distance within the parsed season, and the runtime degrades to the show-level
//! average whenever no candidate is close enough.

use super::catalog_cache::CatalogCache;
use super::catalog_client::CatalogClient;
use crate::models::{CatalogEntity, CatalogEpisode, EpisodeRecord, MatchResult, MediaKind};
use std::sync::Arc;

/// Default acceptance bound: distances 0 to 4 are accepted
pub const DEFAULT_MATCH_THRESHOLD: usize = 5;

/// Why the show-level average runtime was used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The catalog show has no season with the parsed number
    SeasonMissing,
    /// The season is empty or every candidate is too far away
    NoAcceptableMatch { best_distance: Option<usize> },
    /// A candidate was accepted but its runtime could not be fetched
    RuntimeUnavailable,
}

/// How a runtime was obtained for an episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeResolution {
    /// Runtime of the matched catalog episode
    Matched { matched: MatchResult, runtime: u32 },
    /// Show-level average runtime
    Fallback { reason: FallbackReason, runtime: u32 },
}

impl RuntimeResolution {
    pub fn runtime(&self) -> u32 {
        match self {
            RuntimeResolution::Matched { runtime, .. } => *runtime,
            RuntimeResolution::Fallback { runtime, .. } => *runtime,
        }
    }

    /// Accepted with a non-zero distance
    pub fn is_close_match(&self) -> bool {
        matches!(self, RuntimeResolution::Matched { matched, .. } if !matched.is_exact())
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RuntimeResolution::Fallback { .. })
    }
}

/// Result of reconciling one episode record
#[derive(Debug, Clone)]
pub enum EpisodeOutcome {
    /// The series is unknown to the catalog; the record goes to the unknown stream
    Unresolved,
    Resolved {
        show: Arc<CatalogEntity>,
        resolution: RuntimeResolution,
    },
}

/// Matches parsed episodes against catalog season listings
#[derive(Debug, Clone)]
pub struct EpisodeReconciler {
    threshold: usize,
}

impl Default for EpisodeReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl EpisodeReconciler {
    /// `threshold` is exclusive: a candidate is accepted when its distance is below it
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Closest candidate by Levenshtein distance
    ///
    /// Ties go to the candidate listed first. Untitled candidates are ignored.
    /// `None` when nothing is left to compare.
    pub fn best_match(query: &str, candidates: &[CatalogEpisode]) -> Option<MatchResult> {
        let mut best: Option<MatchResult> = None;

        for candidate in candidates.iter().filter(|c| !c.title.is_empty()) {
            let distance = strsim::levenshtein(query, &candidate.title);
            let closer = best.as_ref().map_or(true, |b| distance < b.distance);
            if closer {
                best = Some(MatchResult {
                    episode: candidate.clone(),
                    distance,
                });
                if distance == 0 {
                    break;
                }
            }
        }

        best
    }

    /// Reconcile one episode record against the cached catalog data
    ///
    /// **Algorithm:**
    /// 1. Series not resolved → [`EpisodeOutcome::Unresolved`]
    /// 2. No season with the parsed number → show average
    /// 3. Best candidate below the threshold → its runtime (listing value if present,
    ///    otherwise fetched by external id; show average if that fails)
    /// 4. Otherwise → show average
    pub async fn reconcile(
        &self,
        record: &EpisodeRecord,
        cache: &CatalogCache,
        client: &dyn CatalogClient,
    ) -> EpisodeOutcome {
        let Some(show) = cache.entity(MediaKind::Show, &record.series) else {
            return EpisodeOutcome::Unresolved;
        };

        let resolution = self.resolve_runtime(record, &show, cache, client).await;
        EpisodeOutcome::Resolved { show, resolution }
    }

    async fn resolve_runtime(
        &self,
        record: &EpisodeRecord,
        show: &CatalogEntity,
        cache: &CatalogCache,
        client: &dyn CatalogClient,
    ) -> RuntimeResolution {
        let seasons = cache.seasons(&record.series);
        let Some(season) = seasons
            .iter()
            .find(|s| s.season_number == record.season)
        else {
            tracing::warn!(
                series = %record.series,
                season = record.season,
                "Season not found in catalog, using average show runtime"
            );
            return Self::fallback(show, FallbackReason::SeasonMissing);
        };

        let best = Self::best_match(&record.title, &season.episodes);
        let matched = match best {
            Some(m) if m.distance < self.threshold => m,
            other => {
                tracing::warn!(
                    series = %record.series,
                    season = record.season,
                    episode = %record.title,
                    best_distance = ?other.as_ref().map(|m| m.distance),
                    "No matching episode found, using average show runtime"
                );
                return Self::fallback(
                    show,
                    FallbackReason::NoAcceptableMatch {
                        best_distance: other.map(|m| m.distance),
                    },
                );
            }
        };

        if !matched.is_exact() {
            tracing::warn!(
                series = %record.series,
                query = %record.title,
                target = %matched.episode.title,
                distance = matched.distance,
                "No exact episode match, going with closest"
            );
        }

        let runtime = match matched.episode.runtime {
            Some(runtime) => Some(runtime),
            None => cache.episode_runtime(client, &matched.episode.external_id).await,
        };

        match runtime {
            Some(runtime) => RuntimeResolution::Matched { matched, runtime },
            None => {
                tracing::warn!(
                    series = %record.series,
                    episode_id = %matched.episode.external_id,
                    "Episode runtime unavailable, using average show runtime"
                );
                Self::fallback(show, FallbackReason::RuntimeUnavailable)
            }
        }
    }

    /// Show-level average, or 0 when the catalog has none
    fn fallback(show: &CatalogEntity, reason: FallbackReason) -> RuntimeResolution {
        let runtime = show.runtime.unwrap_or_else(|| {
            tracing::warn!(show = %show.title, "Catalog has no average runtime for show, using 0");
            0
        });
        RuntimeResolution::Fallback { reason, runtime }
    }
}
