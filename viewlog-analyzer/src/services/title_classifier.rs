//! Title classification for viewing history entries
//!
//! The export does not say whether a line is a movie or an episode. Episodes follow
//! the shape `<series>: <marker> <n>: <episode title>`, where the marker is one of
//! `Season`, `Staffel` or `Part`, but both series and episode names may contain colons:
//!
//! ```text
//! Star Trek: Discovery: Season 1: The Vulcan Hello
//! Breaking Bad: Season 1: Pilot
//! PussyTerror TV: Staffel 2: PussyTerror TV vom 16.04.2016
//! Haus des Geldes: Part 1: Episode 1
//! ```
//!
//! **Algorithm:**
//! 1. Split at the last `<marker> <digits>: ` occurrence. Everything before the
//!    split (marker and number included) is the series segment, the rest is the
//!    episode title, kept verbatim.
//! 2. Split the series segment at its last `": "`. The text before it is the series
//!    name, the first digit run after it is the season number.
//!
//! Anything failing either step is a movie with the untouched title. Classification
//! never fails.

use crate::models::{EpisodeRecord, MovieRecord, ViewRecord};
use once_cell::sync::Lazy;
use regex::Regex;

/// Greedy prefix up to the last season marker followed by `": "`
static SHOW_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<series>.*(?:Season|Staffel|Part) [0-9]+): (?P<episode>.*)")
        .expect("show pattern is valid")
});

/// Greedy series name up to the last `": "`, then the marker text and season digits
static SEASON_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<series>.*): (?P<marker>[^0-9]*)(?P<season>[0-9]*)")
        .expect("season pattern is valid")
});

/// Classifies raw titles into movies and episodes
pub struct TitleClassifier;

impl TitleClassifier {
    /// Classify one raw title
    ///
    /// `title` must already be stripped of the surrounding CSV quotes.
    pub fn classify(title: &str, view_date: &str) -> ViewRecord {
        let Some((series_segment, episode_title)) = Self::split_episode(title) else {
            return Self::movie(title, view_date);
        };

        match Self::extract_season(series_segment) {
            Some((series, season)) => ViewRecord::Episode(EpisodeRecord {
                series: series.to_string(),
                season,
                title: episode_title.to_string(),
                view_date: view_date.to_string(),
            }),
            None => {
                // Looked like a series marker but carried no usable season number
                tracing::debug!(title = %title, "Season marker without season number, treating as movie");
                Self::movie(title, view_date)
            }
        }
    }

    /// Stage 1: split into series segment and episode title
    ///
    /// `"Star Trek: Discovery: Season 1: The Vulcan Hello"` →
    /// `("Star Trek: Discovery: Season 1", "The Vulcan Hello")`
    pub fn split_episode(title: &str) -> Option<(&str, &str)> {
        let captures = SHOW_PATTERN.captures(title)?;
        let series_segment = captures.name("series")?.as_str();
        let episode_title = captures.name("episode")?.as_str();
        Some((series_segment, episode_title))
    }

    /// Stage 2: split a series segment into series name and season number
    ///
    /// `"Star Trek: Discovery: Season 1"` → `("Star Trek: Discovery", 1)`
    pub fn extract_season(series_segment: &str) -> Option<(&str, u32)> {
        let captures = SEASON_PATTERN.captures(series_segment)?;
        let series = captures.name("series")?.as_str();
        let season = captures.name("season")?.as_str().parse::<u32>().ok()?;
        Some((series, season))
    }

    fn movie(title: &str, view_date: &str) -> ViewRecord {
        ViewRecord::Movie(MovieRecord {
            title: title.to_string(),
            view_date: view_date.to_string(),
        })
    }
}
