//! Records parsed from the viewing history export

use super::catalog::MediaKind;

/// A line of the export classified as a movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRecord {
    /// Title exactly as it appeared in the export
    pub title: String,
    /// View date, kept as opaque text
    pub view_date: String,
}

/// A line of the export classified as a show episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRecord {
    /// Series name, e.g. "Star Trek: Discovery"
    pub series: String,
    /// Season number parsed from the season marker
    pub season: u32,
    /// Episode title
    pub title: String,
    /// View date, kept as opaque text
    pub view_date: String,
}

/// One entry of the viewing history
///
/// Every entry is exactly one of the two variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewRecord {
    Movie(MovieRecord),
    Episode(EpisodeRecord),
}

impl ViewRecord {
    pub fn is_episode(&self) -> bool {
        matches!(self, ViewRecord::Episode(_))
    }

    /// Movie title or episode title
    pub fn title(&self) -> &str {
        match self {
            ViewRecord::Movie(movie) => &movie.title,
            ViewRecord::Episode(episode) => &episode.title,
        }
    }

    pub fn view_date(&self) -> &str {
        match self {
            ViewRecord::Movie(movie) => &movie.view_date,
            ViewRecord::Episode(episode) => &episode.view_date,
        }
    }

    /// Catalog kind and entity key used to deduplicate lookups
    ///
    /// Movies are keyed by title, episodes by series name.
    pub fn lookup_key(&self) -> (MediaKind, &str) {
        match self {
            ViewRecord::Movie(movie) => (MediaKind::Movie, movie.title.as_str()),
            ViewRecord::Episode(episode) => (MediaKind::Show, episode.series.as_str()),
        }
    }
}

impl From<MovieRecord> for ViewRecord {
    fn from(movie: MovieRecord) -> Self {
        ViewRecord::Movie(movie)
    }
}

impl From<EpisodeRecord> for ViewRecord {
    fn from(episode: EpisodeRecord) -> Self {
        ViewRecord::Episode(episode)
    }
}
