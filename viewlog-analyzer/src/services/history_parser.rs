//! Viewing history file reader
//!
//! The export is a two-column CSV with a header row and quoted fields:
//!
//! ```text
//! Title,Date
//! "Narcos: Season 3: MRO","05/08/2018"
//! "13 Reasons Why: Season 1: Tape 7, Side A","18/05/2018"
//! ```
//!
//! Titles may contain commas, so lines are not split on the delimiter. A line is
//! accepted when it has the shape `"<title>","<date>"`; the title runs up to the
//! last `","`.

use crate::models::ViewRecord;
use crate::services::TitleClassifier;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use viewlog_common::{Error, Result};

static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?P<title>.*)","(?P<date>.*)""#).expect("line pattern is valid")
});

/// Split one export line into raw title and raw date
///
/// Returns `None` when the line does not have the quoted two-field shape.
pub fn split_record(line: &str) -> Option<(&str, &str)> {
    let captures = LINE_PATTERN.captures(line)?;
    Some((captures.name("title")?.as_str(), captures.name("date")?.as_str()))
}

/// Classified contents of one export file
#[derive(Debug, Default)]
pub struct ParsedHistory {
    /// One record per tokenized line, in file order
    pub records: Vec<ViewRecord>,
    /// Lines that could not be tokenized
    pub skipped_lines: usize,
}

/// Reads and classifies a viewing history export
pub struct HistoryParser;

impl HistoryParser {
    /// Parse an export file from disk
    ///
    /// A missing or unreadable file is the one fatal input condition.
    pub fn parse_file(path: &Path) -> Result<ParsedHistory> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "Can not read viewing history file: {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(Error::InvalidInput(format!(
                "Viewing history path is not a file: {}",
                path.display()
            )));
        }

        let file = File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open {}: {}", path.display(), e),
            ))
        })?;

        tracing::info!(path = %path.display(), "Parsing viewing history");
        Self::parse_reader(BufReader::new(file))
    }

    /// Parse an export from any buffered reader
    ///
    /// The first line is the CSV header and is always skipped. Bytes that are not
    /// valid UTF-8 are replaced with U+FFFD and the line is kept.
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<ParsedHistory> {
        let mut parsed = ParsedHistory::default();

        for (index, raw) in reader.split(b'\n').enumerate().skip(1) {
            let bytes = raw?;
            let bytes = bytes.strip_suffix(b"\r").unwrap_or(&bytes[..]);

            let line = String::from_utf8_lossy(bytes);
            if let Cow::Owned(_) = line {
                tracing::warn!(
                    line_number = index + 1,
                    "Line is not valid UTF-8, invalid bytes replaced"
                );
            }

            if line.trim().is_empty() {
                continue;
            }

            match split_record(&line) {
                Some((title, date)) => {
                    parsed.records.push(TitleClassifier::classify(title, date));
                }
                None => {
                    tracing::warn!(
                        line_number = index + 1,
                        line = %line,
                        "Line can not be tokenized, skipping"
                    );
                    parsed.skipped_lines += 1;
                }
            }
        }

        tracing::debug!(
            records = parsed.records.len(),
            skipped = parsed.skipped_lines,
            "Viewing history parsed"
        );

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_split_simple_line() {
        assert_eq!(
            split_record(r#""Narcos: Season 3: MRO","05/08/2018""#),
            Some(("Narcos: Season 3: MRO", "05/08/2018"))
        );
    }

    #[test]
    fn test_split_keeps_commas_in_title() {
        assert_eq!(
            split_record(r#""13 Reasons Why: Season 1: Tape 7, Side A","18/05/2018""#),
            Some(("13 Reasons Why: Season 1: Tape 7, Side A", "18/05/2018"))
        );
    }

    #[test]
    fn test_split_rejects_unquoted_line() {
        assert_eq!(split_record("Title,Date"), None);
        assert_eq!(split_record("garbage"), None);
    }

    #[test]
    fn test_parse_reader_skips_header_and_bad_lines() {
        let input = "Title,Date\n\
                     \"Breaking Bad: Season 1: Pilot\",\"01/02/2018\"\n\
                     not a record\n\
                     \n\
                     \"The Legend of Tarzan\",\"03/02/2018\"\n";

        let parsed = HistoryParser::parse_reader(Cursor::new(input)).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped_lines, 1);
        assert!(parsed.records[0].is_episode());
        assert_eq!(parsed.records[1].title(), "The Legend of Tarzan");
        assert_eq!(parsed.records[1].view_date(), "03/02/2018");
    }

    #[test]
    fn test_parse_reader_survives_invalid_utf8() {
        let mut input: Vec<u8> = Vec::new();
        input.extend_from_slice(b"Title,Date\r\n");
        input.extend_from_slice(b"\"Breaking Bad: Season 1: Pilot\",\"01/02/2018\"\r\n");
        input.extend_from_slice(b"\"Caf\xE9 Society\",\"02/01/2018\"\r\n");
        input.extend_from_slice(b"\"The Legend of Tarzan\",\"03/02/2018\"\r\n");

        let parsed = HistoryParser::parse_reader(Cursor::new(input)).unwrap();

        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.skipped_lines, 0);
        assert!(parsed.records[0].is_episode());
        assert_eq!(parsed.records[1].title(), "Caf\u{FFFD} Society");
        assert_eq!(parsed.records[1].view_date(), "02/01/2018");
        assert_eq!(parsed.records[2].title(), "The Legend of Tarzan");
        assert_eq!(parsed.records[2].view_date(), "03/02/2018");
    }

    #[test]
    fn test_parse_reader_header_only() {
        let parsed = HistoryParser::parse_reader(Cursor::new("Title,Date\n")).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped_lines, 0);
    }

    #[test]
    fn test_parse_file_missing_is_error() {
        let result = HistoryParser::parse_file(Path::new("/nonexistent/viewing-history.csv"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_parse_file_directory_is_error() {
        let dir = std::env::temp_dir();
        let result = HistoryParser::parse_file(&dir);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
