//! Aggregate queries backing the dashboard.

use std::fmt;
use std::str::FromStr;

use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::{Database, DatabaseError};

/// A label with its row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

/// Column a geographic breakdown groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeographyView {
    #[default]
    Region,
    State,
    City,
}

impl GeographyView {
    fn column(&self) -> &'static str {
        match self {
            GeographyView::Region => "region",
            GeographyView::State => "state",
            GeographyView::City => "city",
        }
    }
}

impl fmt::Display for GeographyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for GeographyView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "region" => Ok(GeographyView::Region),
            "state" => Ok(GeographyView::State),
            "city" => Ok(GeographyView::City),
            other => Err(format!("unknown geography view '{}'", other)),
        }
    }
}

pub fn total_records(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM master", [], |r| r.get(0))?))
}

/// Distinct non-empty vendor names in `master`.
pub fn active_vendors(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn.query_row(
            "SELECT COUNT(DISTINCT vendor_name) FROM master
             WHERE vendor_name IS NOT NULL AND vendor_name != ''",
            [],
            |r| r.get(0),
        )?)
    })
}

/// Row counts per vendor, largest first.
pub fn vendor_counts(db: &Database) -> Result<Vec<LabelCount>, DatabaseError> {
    grouped(db, "vendor_name")
}

/// Row counts per region, state or city, largest first.
pub fn geography_counts(
    db: &Database,
    view: GeographyView,
) -> Result<Vec<LabelCount>, DatabaseError> {
    grouped(db, view.column())
}

// `column` is always one of a fixed set of identifiers, never user input.
fn grouped(db: &Database, column: &str) -> Result<Vec<LabelCount>, DatabaseError> {
    let sql = format!(
        "SELECT {column}, COUNT(*) AS count FROM master
         WHERE {column} IS NOT NULL AND {column} != ''
         GROUP BY {column}
         ORDER BY count DESC, {column}"
    );
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LabelCount {
                    label: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Percentage of duplicates over duplicates plus successes across completed
/// uploads, rounded to one decimal. Zero when nothing has been ingested.
pub fn duplicate_rate(db: &Database) -> Result<f64, DatabaseError> {
    let (duplicates, successful): (u64, u64) = db.with_conn(|conn| {
        Ok(conn.query_row(
            "SELECT COALESCE(SUM(duplicates_count), 0), COALESCE(SUM(successful_records), 0)
             FROM uploaded_files WHERE status = ?1",
            params!["completed"],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
    })?;

    let seen = duplicates + successful;
    if seen == 0 {
        return Ok(0.0);
    }
    let rate = duplicates as f64 * 100.0 / seen as f64;
    Ok((rate * 10.0).round() / 10.0)
}
