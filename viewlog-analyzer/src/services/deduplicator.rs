//! Distinct catalog lookup keys
//!
//! Many records share one catalog entity: every episode of a series, every rewatch of
//! a movie. The run resolves each distinct key exactly once.

use crate::models::{MediaKind, ViewRecord};
use std::collections::HashSet;

/// Distinct series names and movie titles of one export
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DistinctKeys {
    pub shows: HashSet<String>,
    pub movies: HashSet<String>,
}

impl DistinctKeys {
    /// Collect the distinct keys of a record set
    pub fn collect<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ViewRecord>,
    {
        let mut keys = Self::default();

        for record in records {
            let (kind, key) = record.lookup_key();
            match kind {
                MediaKind::Show => {
                    if !keys.shows.contains(key) {
                        keys.shows.insert(key.to_string());
                    }
                }
                MediaKind::Movie => {
                    if !keys.movies.contains(key) {
                        keys.movies.insert(key.to_string());
                    }
                }
            }
        }

        keys
    }

    pub fn len(&self) -> usize {
        self.shows.len() + self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty() && self.movies.is_empty()
    }

    /// All keys tagged with their kind, shows first
    pub fn iter(&self) -> impl Iterator<Item = (MediaKind, &str)> {
        self.shows
            .iter()
            .map(|s| (MediaKind::Show, s.as_str()))
            .chain(self.movies.iter().map(|m| (MediaKind::Movie, m.as_str())))
    }
}
