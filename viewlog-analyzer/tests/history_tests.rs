//! Integration tests for reading and classifying viewing history exports

use std::io::Write;
use tempfile::NamedTempFile;
use viewlog_analyzer::models::{EpisodeRecord, ViewRecord};
use viewlog_analyzer::services::{DistinctKeys, HistoryParser, TitleClassifier};

fn export(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Title,Date").unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_parse_export_file() {
    let file = export(&[
        r#""Star Trek: Discovery: Season 1: Context is for Kings","24/10/2017""#,
        r#""The Fresh Prince of Bel-Air: Season 1: Someday Your Prince Will Be in Effect: Part 2","25/10/2017""#,
        r#""Underworld: Awakening","26/10/2017""#,
        r#""Touch: Season 1: 1 + 1 = 3","27/10/2017""#,
    ]);

    let parsed = HistoryParser::parse_file(file.path()).unwrap();

    assert_eq!(parsed.skipped_lines, 0);
    assert_eq!(
        parsed.records,
        vec![
            ViewRecord::Episode(EpisodeRecord {
                series: "Star Trek: Discovery".to_string(),
                season: 1,
                title: "Context is for Kings".to_string(),
                view_date: "24/10/2017".to_string(),
            }),
            ViewRecord::Episode(EpisodeRecord {
                series: "The Fresh Prince of Bel-Air".to_string(),
                season: 1,
                title: "Someday Your Prince Will Be in Effect: Part 2".to_string(),
                view_date: "25/10/2017".to_string(),
            }),
            TitleClassifier::classify("Underworld: Awakening", "26/10/2017"),
            ViewRecord::Episode(EpisodeRecord {
                series: "Touch".to_string(),
                season: 1,
                title: "1 + 1 = 3".to_string(),
                view_date: "27/10/2017".to_string(),
            }),
        ]
    );
    assert!(!parsed.records[2].is_episode());
}

#[test]
fn test_windows_line_endings() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "Title,Date\r\n\"Lie to Me: Season 3: In the Red\",\"01/01/2018\"\r\n").unwrap();
    file.flush().unwrap();

    let parsed = HistoryParser::parse_file(file.path()).unwrap();

    assert_eq!(parsed.records.len(), 1);
    match &parsed.records[0] {
        ViewRecord::Episode(episode) => {
            assert_eq!(episode.series, "Lie to Me");
            assert_eq!(episode.title, "In the Red");
            assert_eq!(episode.view_date, "01/01/2018");
        }
        other => panic!("expected episode, got {:?}", other),
    }
}

#[test]
fn test_distinct_keys_from_export() {
    let file = export(&[
        r#""Lie to Me: Season 3: In the Red","01/01/2018""#,
        r#""Lie to Me: Season 3: Beyond Belief","02/01/2018""#,
        r#""Lie to Me: Season 2: Truth or Consequences","03/01/2018""#,
        r#""The Legend of Tarzan","04/01/2018""#,
    ]);

    let parsed = HistoryParser::parse_file(file.path()).unwrap();
    let keys = DistinctKeys::collect(&parsed.records);

    assert_eq!(keys.shows.len(), 1);
    assert_eq!(keys.movies.len(), 1);
}
