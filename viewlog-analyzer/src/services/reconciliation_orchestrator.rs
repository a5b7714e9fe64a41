//! Reconciliation run controller
//!
//! Drives one run end to end:
//!
//! 1. **Parse**: tokenize and classify every line of the export
//! 2. **Deduplicate**: distinct series names and movie titles
//! 3. **Resolve**: one catalog lookup per distinct key, bounded concurrency
//! 4. **Seasons**: download the season listing of every resolved show
//! 5. **Reconcile**: per record, with `workers` records in flight, route to an output
//!
//! Steps 3 to 5 run under the drain timeout. When it expires, or the cancellation
//! token fires, in-flight work is abandoned and the output streams are still flushed.

use super::catalog_cache::CatalogCache;
use super::catalog_client::CatalogClient;
use super::deduplicator::DistinctKeys;
use super::episode_reconciler::{EpisodeOutcome, EpisodeReconciler, DEFAULT_MATCH_THRESHOLD};
use super::history_parser::{HistoryParser, ParsedHistory};
use super::output_router::OutputRouter;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::{MediaKind, RunStatistics, RunSummary, ViewRecord};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use viewlog_common::config::AnalyzerSettings;

/// Records between two progress log lines
const PROGRESS_INTERVAL: usize = 250;

/// Tunables of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Records reconciled concurrently
    pub workers: usize,
    /// Catalog lookups in flight while resolving entities and seasons
    pub lookup_concurrency: usize,
    /// Ceiling on catalog resolution plus reconciliation
    pub drain_timeout: Duration,
    /// Episode matches are accepted below this edit distance
    pub match_threshold: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 15,
            lookup_concurrency: 8,
            drain_timeout: Duration::from_secs(300),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl From<&AnalyzerSettings> for RunOptions {
    fn from(settings: &AnalyzerSettings) -> Self {
        Self {
            workers: settings.workers.max(1),
            lookup_concurrency: settings.lookup_concurrency.max(1),
            drain_timeout: Duration::from_secs(settings.drain_timeout_secs),
            match_threshold: settings.match_threshold,
        }
    }
}

/// Runs the classify → resolve → reconcile → output pipeline
pub struct ReconciliationOrchestrator {
    client: Arc<dyn CatalogClient>,
    options: RunOptions,
    reconciler: EpisodeReconciler,
}

impl ReconciliationOrchestrator {
    pub fn new(client: Arc<dyn CatalogClient>, options: RunOptions) -> Self {
        let reconciler = EpisodeReconciler::new(options.match_threshold);
        Self {
            client,
            options,
            reconciler,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Parse an export file and run the pipeline over it
    pub async fn run_file(
        &self,
        input: &Path,
        router: &OutputRouter,
        cancel_token: &CancellationToken,
    ) -> AnalyzerResult<RunSummary> {
        let path: PathBuf = input.to_path_buf();
        let parsed = tokio::task::spawn_blocking(move || HistoryParser::parse_file(&path))
            .await
            .map_err(|e| AnalyzerError::Internal(format!("Parser task failed: {}", e)))?
            .map_err(|e| AnalyzerError::Input(e.to_string()))?;

        Ok(self.run(parsed, router, cancel_token).await)
    }

    /// Run the pipeline over already parsed records
    ///
    /// Never fails: per-record problems are logged and counted in the summary.
    pub async fn run(
        &self,
        parsed: ParsedHistory,
        router: &OutputRouter,
        cancel_token: &CancellationToken,
    ) -> RunSummary {
        let run_id = Uuid::new_v4();
        let start_time = Instant::now();
        let stats = RunStatistics::new();
        let cache = CatalogCache::new();

        let records = parsed.records;
        RunStatistics::set(&stats.items_parsed, records.len());
        RunStatistics::set(&stats.lines_skipped, parsed.skipped_lines);

        let keys = DistinctKeys::collect(&records);
        RunStatistics::set(&stats.distinct_shows, keys.shows.len());
        RunStatistics::set(&stats.distinct_movies, keys.movies.len());

        tracing::info!(
            run_id = %run_id,
            catalog = self.client.name(),
            records = records.len(),
            distinct_shows = keys.shows.len(),
            distinct_movies = keys.movies.len(),
            workers = self.options.workers,
            "Reconciliation run started"
        );

        let pipeline = self.resolve_and_reconcile(
            run_id,
            &records,
            &keys,
            &cache,
            router,
            &stats,
            cancel_token,
        );
        let timed_out = tokio::time::timeout(self.options.drain_timeout, pipeline)
            .await
            .is_err();

        if timed_out {
            tracing::warn!(
                run_id = %run_id,
                timeout_secs = self.options.drain_timeout.as_secs(),
                "Drain timeout reached, abandoning in-flight records"
            );
        }

        if let Err(e) = router.flush() {
            tracing::error!(run_id = %run_id, error = %e, "Failed to flush output files");
        }

        RunStatistics::set(&stats.shows_not_found, cache.not_found_count(MediaKind::Show));
        RunStatistics::set(&stats.movies_not_found, cache.not_found_count(MediaKind::Movie));

        let mut summary = stats.snapshot();
        summary.timed_out = timed_out;
        summary.cancelled = cancel_token.is_cancelled();

        tracing::info!(
            run_id = %run_id,
            duration_ms = start_time.elapsed().as_millis() as u64,
            catalog_requests = cache.request_count(),
            episodes = summary.episodes_resolved,
            movies = summary.movies_resolved,
            unknown = summary.unresolved,
            close_matches = summary.close_matches,
            fallbacks = summary.runtime_fallbacks,
            timed_out = summary.timed_out,
            cancelled = summary.cancelled,
            "Reconciliation run finished"
        );

        summary
    }

    #[allow(clippy::too_many_arguments)]
    async fn resolve_and_reconcile(
        &self,
        run_id: Uuid,
        records: &[ViewRecord],
        keys: &DistinctKeys,
        cache: &CatalogCache,
        router: &OutputRouter,
        stats: &RunStatistics,
        cancel_token: &CancellationToken,
    ) {
        let client = self.client.as_ref();
        let concurrency = self.options.lookup_concurrency;

        cache.resolve_all(client, keys, concurrency, cancel_token).await;
        cache.load_seasons(client, concurrency, cancel_token).await;

        if cancel_token.is_cancelled() {
            tracing::info!(run_id = %run_id, "Run cancelled before reconciliation");
            return;
        }

        let total = records.len();
        let processed = AtomicUsize::new(0);

        stream::iter(records)
            .map(|record| {
                let processed = &processed;
                async move {
                    if cancel_token.is_cancelled() {
                        return;
                    }

                    self.process_record(record, cache, router, stats).await;

                    let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if current % PROGRESS_INTERVAL == 0 || current == total {
                        tracing::info!(
                            run_id = %run_id,
                            progress = format!("{}/{}", current, total),
                            "Reconciliation progress"
                        );
                    }
                }
            })
            .buffer_unordered(self.options.workers.max(1))
            .collect::<Vec<()>>()
            .await;

        if cancel_token.is_cancelled() {
            tracing::info!(
                run_id = %run_id,
                processed = processed.load(Ordering::Relaxed),
                total,
                "Run cancelled during reconciliation"
            );
        }
    }

    /// Reconcile one record and write it to its stream
    async fn process_record(
        &self,
        record: &ViewRecord,
        cache: &CatalogCache,
        router: &OutputRouter,
        stats: &RunStatistics,
    ) {
        let written = match record {
            ViewRecord::Movie(movie) => match cache.entity(MediaKind::Movie, &movie.title) {
                Some(entity) => router
                    .write_movie(movie, &entity)
                    .map(|_| RunStatistics::bump(&stats.movies_resolved)),
                None => {
                    tracing::debug!(title = %movie.title, "Unresolved movie");
                    router
                        .write_unknown(record)
                        .map(|_| RunStatistics::bump(&stats.unresolved))
                }
            },
            ViewRecord::Episode(episode) => {
                match self
                    .reconciler
                    .reconcile(episode, cache, self.client.as_ref())
                    .await
                {
                    EpisodeOutcome::Unresolved => {
                        tracing::debug!(
                            series = %episode.series,
                            title = %episode.title,
                            "Unresolved episode"
                        );
                        router
                            .write_unknown(record)
                            .map(|_| RunStatistics::bump(&stats.unresolved))
                    }
                    EpisodeOutcome::Resolved { show, resolution } => {
                        if resolution.is_close_match() {
                            RunStatistics::bump(&stats.close_matches);
                        }
                        if resolution.is_fallback() {
                            RunStatistics::bump(&stats.runtime_fallbacks);
                        }
                        router
                            .write_episode(episode, &show, resolution.runtime())
                            .map(|_| RunStatistics::bump(&stats.episodes_resolved))
                    }
                }
            }
        };

        if let Err(e) = written {
            tracing::error!(title = %record.title(), error = %e, "Failed to write output row");
        }
    }
}
