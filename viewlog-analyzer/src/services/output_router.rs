//! Output router
//!
//! Three delimited output streams, each guarded by its own lock so workers writing
//! movies never wait on workers writing episodes:
//!
//! | Stream  | Header                                                           |
//! |---------|------------------------------------------------------------------|
//! | movie   | `Date;Title;Runtime;Certificate;Released;Genres`                 |
//! | show    | `Date;Series;Title;Season;Runtime;Certificate;FirstAired;Network;Genres` |
//! | unknown | `Date;Type;Title;Series`                                         |
//!
//! Headers are written when the router is built, before any worker starts. Absent
//! catalog values render as empty fields.

use crate::models::{CatalogEntity, EpisodeRecord, MovieRecord, ViewRecord};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const MOVIE_FILE_NAME: &str = "MovieViewingHistory.csv";
pub const SHOW_FILE_NAME: &str = "ShowViewingHistory.csv";
pub const UNKNOWN_FILE_NAME: &str = "UnknownViewingHistory.csv";

const MOVIE_HEADER: &[&str] = &["Date", "Title", "Runtime", "Certificate", "Released", "Genres"];
const SHOW_HEADER: &[&str] = &[
    "Date",
    "Series",
    "Title",
    "Season",
    "Runtime",
    "Certificate",
    "FirstAired",
    "Network",
    "Genres",
];
const UNKNOWN_HEADER: &[&str] = &["Date", "Type", "Title", "Series"];

/// `FirstAired` column format
const FIRST_AIRED_FORMAT: &str = "%d.%m.%Y";

type BoxedWriter = Box<dyn Write + Send>;

/// One delimited output stream
pub struct DelimitedWriter {
    name: &'static str,
    writer: Mutex<BoxedWriter>,
    delimiter: String,
    header_len: usize,
}

impl DelimitedWriter {
    /// Wrap a writer and emit the header row
    pub fn new(
        name: &'static str,
        mut writer: BoxedWriter,
        delimiter: &str,
        header: &[&str],
    ) -> io::Result<Self> {
        writeln!(writer, "{}", header.join(delimiter))?;

        Ok(Self {
            name,
            writer: Mutex::new(writer),
            delimiter: delimiter.to_string(),
            header_len: header.len(),
        })
    }

    /// Append one row
    ///
    /// Rows longer than the header are still written, with a warning.
    pub fn write_row(&self, fields: &[String]) -> io::Result<()> {
        if fields.len() > self.header_len {
            tracing::warn!(
                stream = self.name,
                fields = fields.len(),
                header_fields = self.header_len,
                "More entries than header fields"
            );
        }

        let line = fields.join(&self.delimiter);
        let mut writer = self.lock()?;
        writeln!(writer, "{}", line)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.lock()?.flush()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, BoxedWriter>> {
        self.writer.lock().map_err(|_| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("{} output lock poisoned", self.name),
            )
        })
    }
}

/// Routes finished records to the movie, show and unknown streams
pub struct OutputRouter {
    movies: DelimitedWriter,
    shows: DelimitedWriter,
    unknown: DelimitedWriter,
}

impl OutputRouter {
    /// Create (truncating) the three output files inside `output_dir`
    pub fn create(output_dir: &Path, delimiter: &str) -> io::Result<Self> {
        std::fs::create_dir_all(output_dir)?;

        let open = |file_name: &str| -> io::Result<BoxedWriter> {
            let path: PathBuf = output_dir.join(file_name);
            let file = File::create(&path).map_err(|e| {
                io::Error::new(e.kind(), format!("Can not create {}: {}", path.display(), e))
            })?;
            tracing::debug!(path = %path.display(), "Output file created");
            Ok(Box::new(BufWriter::new(file)))
        };

        Self::from_writers(
            open(MOVIE_FILE_NAME)?,
            open(SHOW_FILE_NAME)?,
            open(UNKNOWN_FILE_NAME)?,
            delimiter,
        )
    }

    /// Build a router over arbitrary writers
    pub fn from_writers(
        movies: BoxedWriter,
        shows: BoxedWriter,
        unknown: BoxedWriter,
        delimiter: &str,
    ) -> io::Result<Self> {
        Ok(Self {
            movies: DelimitedWriter::new("movie", movies, delimiter, MOVIE_HEADER)?,
            shows: DelimitedWriter::new("show", shows, delimiter, SHOW_HEADER)?,
            unknown: DelimitedWriter::new("unknown", unknown, delimiter, UNKNOWN_HEADER)?,
        })
    }

    /// Movie row: the title column carries the catalog title
    pub fn write_movie(&self, record: &MovieRecord, movie: &CatalogEntity) -> io::Result<()> {
        self.movies.write_row(&[
            record.view_date.clone(),
            movie.title.clone(),
            optional(movie.runtime),
            movie.certification.clone().unwrap_or_default(),
            optional(movie.released),
            format_genres(&movie.genres),
        ])
    }

    pub fn write_episode(
        &self,
        record: &EpisodeRecord,
        show: &CatalogEntity,
        runtime: u32,
    ) -> io::Result<()> {
        let first_aired = show
            .first_aired
            .map(|date| date.format(FIRST_AIRED_FORMAT).to_string())
            .unwrap_or_default();

        self.shows.write_row(&[
            record.view_date.clone(),
            record.series.clone(),
            record.title.clone(),
            record.season.to_string(),
            runtime.to_string(),
            show.certification.clone().unwrap_or_default(),
            first_aired,
            show.network.clone().unwrap_or_default(),
            format_genres(&show.genres),
        ])
    }

    /// Record whose entity the catalog does not know
    pub fn write_unknown(&self, record: &ViewRecord) -> io::Result<()> {
        let (kind, _) = record.lookup_key();
        match record {
            ViewRecord::Movie(movie) => self.unknown.write_row(&[
                movie.view_date.clone(),
                kind.to_string(),
                movie.title.clone(),
            ]),
            ViewRecord::Episode(episode) => self.unknown.write_row(&[
                episode.view_date.clone(),
                kind.to_string(),
                episode.title.clone(),
                episode.series.clone(),
            ]),
        }
    }

    /// Flush all three streams
    ///
    /// Every stream is flushed even when an earlier one fails; the first error is returned.
    pub fn flush(&self) -> io::Result<()> {
        let results = [self.movies.flush(), self.shows.flush(), self.unknown.flush()];
        results.into_iter().collect()
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// `["drama", "crime"]` → `[drama, crime]`
pub fn format_genres(genres: &[String]) -> String {
    format!("[{}]", genres.join(", "))
}
