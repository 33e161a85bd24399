//! Download repository: export queries and `downloads_history` rows.

use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::master_repo::MasterRow;
use super::{now_timestamp, param_refs, Database, DatabaseError};

/// Whether the disposition list keeps or drops matching rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispositionAction {
    Include,
    Exclude,
}

/// Filters applied to an export. Stored verbatim as JSON in the history row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportFilter {
    pub zip_codes: Vec<String>,
    pub disposition_action: Option<DispositionAction>,
    pub dispositions: Vec<String>,
    /// Inclusive lower bound on `created_at`, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Inclusive upper bound on `created_at`, `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

/// A row of download history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRow {
    pub id: i64,
    pub file_name: String,
    pub record_count: u64,
    pub filters: ExportFilter,
    pub created_by: Option<String>,
    pub download_date: String,
}

impl DownloadRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let filters: String = row.get("filters")?;
        Ok(Self {
            id: row.get("id")?,
            file_name: row.get("file_name")?,
            record_count: row.get("record_count")?,
            filters: serde_json::from_str(&filters).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
            })?,
            created_by: row.get("created_by")?,
            download_date: row.get("download_date")?,
        })
    }
}

/// Master rows matching `filter`, ordered by id.
pub fn query_export(db: &Database, filter: &ExportFilter) -> Result<Vec<MasterRow>, DatabaseError> {
    let mut conditions = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if !filter.zip_codes.is_empty() {
        let list = placeholders(param_values.len(), filter.zip_codes.len());
        conditions.push(format!("m.zipcode IN ({})", list));
        for zip in &filter.zip_codes {
            param_values.push(Box::new(zip.clone()));
        }
    }

    if let Some(action) = filter.disposition_action {
        if !filter.dispositions.is_empty() {
            let list = placeholders(param_values.len(), filter.dispositions.len());
            conditions.push(match action {
                DispositionAction::Include => format!("d.disposition_type IN ({})", list),
                DispositionAction::Exclude => format!(
                    "(d.disposition_type IS NULL OR d.disposition_type NOT IN ({}))",
                    list
                ),
            });
            for kind in &filter.dispositions {
                param_values.push(Box::new(kind.clone()));
            }
        }
    }

    if let Some(ref start) = filter.start_date {
        conditions.push(format!(
            "substr(m.created_at, 1, 10) >= ?{}",
            param_values.len() + 1
        ));
        param_values.push(Box::new(start.clone()));
    }
    if let Some(ref end) = filter.end_date {
        conditions.push(format!(
            "substr(m.created_at, 1, 10) <= ?{}",
            param_values.len() + 1
        ));
        param_values.push(Box::new(end.clone()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT DISTINCT m.* FROM master m
         LEFT JOIN dispositions d
           ON d.phone_number IN (m.phone1, m.phone2, m.phone3, m.phone4)
         {}
         ORDER BY m.id",
        where_clause
    );

    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(param_refs(&param_values).as_slice(), MasterRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

fn placeholders(already_bound: usize, count: usize) -> String {
    (already_bound + 1..=already_bound + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Records a completed export, returning the history id.
pub fn insert(
    db: &Database,
    file_name: &str,
    record_count: u64,
    filter: &ExportFilter,
    created_by: &str,
) -> Result<i64, DatabaseError> {
    let filters = serde_json::to_string(filter)?;
    let now = now_timestamp();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO downloads_history (file_name, record_count, filters, created_by, download_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![file_name, record_count as i64, filters, created_by, now],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Most recent downloads first.
pub fn history(db: &Database, limit: u64) -> Result<Vec<DownloadRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM downloads_history ORDER BY download_date DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], DownloadRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<DownloadRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM downloads_history WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], DownloadRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM downloads_history WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    })
}
