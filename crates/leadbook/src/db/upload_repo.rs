//! Upload repository: one row per ingestion attempt in `uploaded_files`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rusqlite::{params, Row};
use serde::Serialize;

use super::{now_timestamp, param_refs, Database, DatabaseError};

/// Lifecycle status of an upload job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Processing => "processing",
            UploadStatus::Completed => "completed",
            UploadStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadStatus::Processing)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(UploadStatus::Processing),
            "completed" => Ok(UploadStatus::Completed),
            "failed" => Ok(UploadStatus::Failed),
            other => Err(format!("unknown upload status '{}'", other)),
        }
    }
}

/// A persisted upload job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRow {
    pub id: i64,
    pub filename: String,
    pub vendor_name: String,
    pub total_records: u64,
    pub duplicates_count: u64,
    pub successful_records: u64,
    pub failed_records: u64,
    pub status: UploadStatus,
    pub error_message: Option<String>,
    pub headers: Option<Vec<String>>,
    pub mapping: Option<BTreeMap<String, String>>,
    pub created_at: String,
    pub updated_at: String,
}

impl UploadRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let status: String = row.get("status")?;
        let headers: Option<String> = row.get("headers")?;
        let mapping: Option<String> = row.get("mapping")?;
        Ok(Self {
            id: row.get("id")?,
            filename: row.get("filename")?,
            vendor_name: row.get("vendor_name")?,
            total_records: row.get("total_records")?,
            duplicates_count: row.get("duplicates_count")?,
            successful_records: row.get("successful_records")?,
            failed_records: row.get("failed_records")?,
            status: status.parse::<UploadStatus>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    e.into(),
                )
            })?,
            error_message: row.get("error_message")?,
            headers: decode_json(headers)?,
            mapping: decode_json(mapping)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Records classified so far.
    pub fn processed(&self) -> u64 {
        self.duplicates_count + self.successful_records + self.failed_records
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(
    raw: Option<String>,
) -> Result<Option<T>, rusqlite::Error> {
    raw.map(|s| {
        serde_json::from_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
        })
    })
    .transpose()
}

/// Fields known when an upload job is created.
#[derive(Debug, Clone, Default)]
pub struct NewUpload {
    pub filename: String,
    pub vendor_name: String,
    pub mapping: Option<BTreeMap<String, String>>,
}

/// A partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadUpdate {
    pub status: Option<UploadStatus>,
    pub total_records: Option<u64>,
    pub duplicates_count: Option<u64>,
    pub successful_records: Option<u64>,
    pub failed_records: Option<u64>,
    pub error_message: Option<String>,
    pub headers: Option<Vec<String>>,
}

impl UploadUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Inserts a new job in `processing` status, returning its ID.
pub fn insert(db: &Database, upload: &NewUpload) -> Result<i64, DatabaseError> {
    let mapping = upload
        .mapping
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let now = now_timestamp();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO uploaded_files (filename, vendor_name, status, mapping, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                upload.filename,
                upload.vendor_name,
                UploadStatus::Processing.as_str(),
                mapping,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Applies a partial update. `updated_at` is always refreshed.
pub fn update(db: &Database, id: i64, changes: &UploadUpdate) -> Result<(), DatabaseError> {
    let mut assignments = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(status) = changes.status {
        assignments.push(format!("status = ?{}", param_values.len() + 1));
        param_values.push(Box::new(status.as_str()));
    }
    let counters = [
        ("total_records", changes.total_records),
        ("duplicates_count", changes.duplicates_count),
        ("successful_records", changes.successful_records),
        ("failed_records", changes.failed_records),
    ];
    for (column, value) in counters {
        if let Some(value) = value {
            assignments.push(format!("{} = ?{}", column, param_values.len() + 1));
            param_values.push(Box::new(value as i64));
        }
    }
    if let Some(ref message) = changes.error_message {
        assignments.push(format!("error_message = ?{}", param_values.len() + 1));
        param_values.push(Box::new(message.clone()));
    }
    if let Some(ref headers) = changes.headers {
        assignments.push(format!("headers = ?{}", param_values.len() + 1));
        param_values.push(Box::new(serde_json::to_string(headers)?));
    }

    assignments.push(format!("updated_at = ?{}", param_values.len() + 1));
    param_values.push(Box::new(now_timestamp()));
    param_values.push(Box::new(id));

    let sql = format!(
        "UPDATE uploaded_files SET {} WHERE id = ?{}",
        assignments.join(", "),
        param_values.len()
    );

    db.with_conn(|conn| {
        conn.execute(&sql, param_refs(&param_values).as_slice())?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<UploadRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM uploaded_files WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], UploadRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists jobs newest first.
pub fn list(db: &Database, limit: u64, offset: u64) -> Result<Vec<UploadRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM uploaded_files ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], UploadRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
