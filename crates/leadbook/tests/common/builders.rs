//! Builders for CSV fixtures and mappings.

#![allow(dead_code)]

use std::collections::BTreeMap;

/// Builds CSV text row by row.
pub struct CsvBuilder {
    bom: bool,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvBuilder {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            bom: false,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Prefix the output with a UTF-8 byte order mark.
    pub fn with_bom(mut self) -> Self {
        self.bom = true;
        self
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows.push(values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Appends `count` rows, each produced from its index.
    pub fn rows_with<F>(mut self, count: usize, f: F) -> Self
    where
        F: Fn(usize) -> Vec<String>,
    {
        for i in 0..count {
            self.rows.push(f(i));
        }
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        if self.bom {
            out.push('\u{feff}');
        }
        out.push_str(&self.headers.join(","));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }
}

/// Builds the header → column map sent by the operator.
#[derive(Default)]
pub struct MappingBuilder {
    map: BTreeMap<String, String>,
}

impl MappingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, source: &str, column: &str) -> Self {
        self.map.insert(source.to_string(), column.to_string());
        self
    }

    /// Marks a header as explicitly unmapped.
    pub fn skip(mut self, source: &str) -> Self {
        self.map.insert(source.to_string(), String::new());
        self
    }

    pub fn build(self) -> BTreeMap<String, String> {
        self.map
    }
}
