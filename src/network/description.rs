use std::{fs::File, io::Read, path::Path, time::Instant};

use tracing::debug;

use crate::network::{self, StationKind};

/// One service line: its kind and its stops in running order.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub kind: StationKind,
    pub label: String,
    pub stops: Vec<String>,
}

impl LineSpec {
    pub fn new<S: AsRef<str>>(kind: StationKind, stops: &[S]) -> Self {
        Self {
            kind,
            label: kind.as_str().into(),
            stops: stops.iter().map(|stop| stop.as_ref().to_string()).collect(),
        }
    }

    /// Builds a line from its description keyword (`Subway`, `Bus`, ...).
    pub fn from_keyword<S: AsRef<str>>(keyword: &str, stops: &[S]) -> Result<Self, network::Error> {
        let kind = StationKind::from_keyword(keyword)
            .ok_or_else(|| network::Error::UnknownKind(keyword.to_string()))?;
        Ok(Self {
            label: keyword.to_string(),
            ..Self::new(kind, stops)
        })
    }
}

/// Reads a network description, one line per service line:
///
/// ```text
/// Subway Line 1: Kipling, Jane, Bloor, Yonge
/// Bus Route 7: Jane, Finch
/// ```
///
/// The first word picks the kind, the rest of the label is free text. Blank
/// lines and lines starting with `#` are skipped.
pub fn read_description<R: Read>(reader: R) -> Result<Vec<LineSpec>, network::Error> {
    let now = Instant::now();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b':')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut lines = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let (Some(label), Some(stops), None) = (record.get(0), record.get(1), record.get(2)) else {
            let line = record
                .position()
                .map_or(i + 1, |position| position.line() as usize);
            return Err(network::Error::MalformedLine(line));
        };
        let keyword = label.split_whitespace().next().unwrap_or_default();
        let stops: Vec<&str> = stops
            .split(',')
            .map(str::trim)
            .filter(|stop| !stop.is_empty())
            .collect();
        let mut line = LineSpec::from_keyword(keyword, &stops)?;
        line.label = label.to_string();
        lines.push(line);
    }
    debug!("Reading {} lines took {:?}", lines.len(), now.elapsed());
    Ok(lines)
}

pub fn read_description_file<P: AsRef<Path>>(path: P) -> Result<Vec<LineSpec>, network::Error> {
    let file = File::open(path)?;
    read_description(file)
}

#[test]
fn reads_lines_and_kinds() {
    let text = "Subway Line 1: A, B, C\nBus Route 7: C, D\n";
    let lines = read_description(text.as_bytes()).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].kind, StationKind::Rail);
    assert_eq!(lines[0].label, "Subway Line 1");
    assert_eq!(lines[0].stops, vec!["A", "B", "C"]);
    assert_eq!(lines[1].kind, StationKind::Surface);
    assert_eq!(lines[1].stops, vec!["C", "D"]);
}

#[test]
fn skips_comments_and_blank_lines() {
    let text = "# network\n\nSubway Line 1: A, B\n";
    let lines = read_description(text.as_bytes()).unwrap();
    assert_eq!(lines.len(), 1);
}

#[test]
fn rejects_unknown_keyword() {
    let text = "Ferry Line 1: A, B\n";
    assert!(matches!(
        read_description(text.as_bytes()),
        Err(network::Error::UnknownKind(keyword)) if keyword == "Ferry"
    ));
}

#[test]
fn rejects_line_without_stops_field() {
    let text = "Subway Line 1 A B\n";
    assert!(matches!(
        read_description(text.as_bytes()),
        Err(network::Error::MalformedLine(1))
    ));
}

#[test]
fn malformed_line_reports_file_line() {
    let text = "# network\n\nSubway Line 1: A, B\nSubway Line 2 C D\n";
    assert!(matches!(
        read_description(text.as_bytes()),
        Err(network::Error::MalformedLine(4))
    ));
}
