//! Run counters and the end-of-run summary
//!
//! Workers bump [`RunStatistics`] concurrently; the orchestrator takes a
//! [`RunSummary`] snapshot once the pool has drained.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Thread-safe counters shared by all workers of one run
#[derive(Debug, Default)]
pub struct RunStatistics {
    pub items_parsed: AtomicUsize,
    pub lines_skipped: AtomicUsize,
    pub distinct_shows: AtomicUsize,
    pub distinct_movies: AtomicUsize,
    pub shows_not_found: AtomicUsize,
    pub movies_not_found: AtomicUsize,
    pub episodes_resolved: AtomicUsize,
    pub movies_resolved: AtomicUsize,
    pub unresolved: AtomicUsize,
    pub close_matches: AtomicUsize,
    pub runtime_fallbacks: AtomicUsize,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by one
    pub fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set(counter: &AtomicUsize, value: usize) {
        counter.store(value, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunSummary {
        let load = |counter: &AtomicUsize| counter.load(Ordering::Relaxed);

        RunSummary {
            items_parsed: load(&self.items_parsed),
            lines_skipped: load(&self.lines_skipped),
            distinct_shows: load(&self.distinct_shows),
            distinct_movies: load(&self.distinct_movies),
            shows_not_found: load(&self.shows_not_found),
            movies_not_found: load(&self.movies_not_found),
            episodes_resolved: load(&self.episodes_resolved),
            movies_resolved: load(&self.movies_resolved),
            unresolved: load(&self.unresolved),
            close_matches: load(&self.close_matches),
            runtime_fallbacks: load(&self.runtime_fallbacks),
            timed_out: false,
            cancelled: false,
        }
    }
}

/// Immutable snapshot of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records produced by the classifier
    pub items_parsed: usize,
    /// Input lines the tokenizer could not split
    pub lines_skipped: usize,
    /// Distinct series names found in the export
    pub distinct_shows: usize,
    /// Distinct movie titles found in the export
    pub distinct_movies: usize,
    pub shows_not_found: usize,
    pub movies_not_found: usize,
    /// Episode rows written to the show stream
    pub episodes_resolved: usize,
    /// Movie rows written to the movie stream
    pub movies_resolved: usize,
    /// Rows written to the unknown stream
    pub unresolved: usize,
    /// Episodes accepted with a non-zero edit distance
    pub close_matches: usize,
    /// Episodes that fell back to the show-level average runtime
    pub runtime_fallbacks: usize,
    /// The drain timeout expired before every record was processed
    pub timed_out: bool,
    /// The run was interrupted before every record was processed
    pub cancelled: bool,
}

impl RunSummary {
    /// Records that reached one of the three output streams
    pub fn records_written(&self) -> usize {
        self.episodes_resolved + self.movies_resolved + self.unresolved
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("Items parsed:", self.items_parsed),
            ("Unique shows:", self.distinct_shows.saturating_sub(self.shows_not_found)),
            ("Episodes:", self.episodes_resolved),
            ("Unique movies:", self.distinct_movies.saturating_sub(self.movies_not_found)),
            ("Movie views:", self.movies_resolved),
            ("Unknown:", self.unresolved),
            ("Close matches:", self.close_matches),
            ("Fallbacks:", self.runtime_fallbacks),
            ("Lines skipped:", self.lines_skipped),
        ];

        let width = rows
            .iter()
            .map(|(_, value)| value.to_string().len())
            .max()
            .unwrap_or(1);

        writeln!(f, "Finished:")?;
        writeln!(f, "-----------------------------------------")?;
        for (label, value) in rows {
            writeln!(f, "{:>14} {:>width$}", label, value, width = width)?;
        }
        if self.timed_out {
            writeln!(f, "Drain timeout reached, output is incomplete")?;
        }
        if self.cancelled {
            writeln!(f, "Run cancelled, output is incomplete")?;
        }
        Ok(())
    }
}
