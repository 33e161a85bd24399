//! CSV reading: header row first, comma separated, fields trimmed.

use std::path::Path;
use std::sync::Arc;

use super::error::IngestError;

const BOM: char = '\u{feff}';

/// One data row keyed by the file's header row.
///
/// Short rows simply lack their trailing fields; cells beyond the header
/// width are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl RawRecord {
    pub fn new(headers: Arc<[String]>, values: Vec<String>) -> Self {
        Self { headers, values }
    }

    /// Value of the named field. With repeated header names the rightmost
    /// present column wins.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.iter()
            .filter(|(header, _)| *header == field)
            .last()
            .map(|(_, value)| value)
    }

    /// (header, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len().min(self.headers.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Headers plus data rows of a parsed file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// Parses a whole file. A file without data rows is [`IngestError::EmptyInput`].
pub fn parse(content: &str) -> Result<ParsedCsv, IngestError> {
    let parsed = read(content, None)?;
    if parsed.records.is_empty() {
        return Err(IngestError::EmptyInput);
    }
    Ok(parsed)
}

/// Headers and at most `rows` records. An empty file yields an empty preview.
pub fn preview(content: &str, rows: usize) -> Result<ParsedCsv, IngestError> {
    read(content, Some(rows))
}

/// Reads `path` as UTF-8 and parses it.
pub fn read_path(path: &Path) -> Result<ParsedCsv, IngestError> {
    let content = read_to_string(path)?;
    parse(&content)
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    String::from_utf8(bytes).map_err(|_| IngestError::InvalidEncoding)
}

fn read(content: &str, limit: Option<usize>) -> Result<ParsedCsv, IngestError> {
    let content = content.strip_prefix(BOM).unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let shared: Arc<[String]> = headers.clone().into();

    let mut records = Vec::new();
    for row in reader.records() {
        if limit.is_some_and(|max| records.len() >= max) {
            break;
        }
        let row = row?;
        records.push(RawRecord::new(
            Arc::clone(&shared),
            row.iter().map(str::to_string).collect(),
        ));
    }

    Ok(ParsedCsv { headers, records })
}
