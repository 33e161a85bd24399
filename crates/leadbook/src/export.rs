//! Filtered CSV export of master rows and the download history.

use serde::Serialize;
use tracing::info;

use crate::contact::ContactColumn;
use crate::db::download_repo::{self, DownloadRow, ExportFilter};
use crate::db::master_repo::MasterRow;
use crate::db::Database;
use crate::error::ExportError;

/// A rendered export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub file_name: String,
    pub record_count: u64,
    #[serde(skip)]
    pub content: Vec<u8>,
}

/// Runs the filtered query, renders it and records a history entry.
pub fn export(
    db: &Database,
    file_name: &str,
    filter: &ExportFilter,
    created_by: &str,
) -> Result<ExportFile, ExportError> {
    let file_name = file_name.trim();
    if file_name.is_empty() {
        return Err(ExportError::MissingField("fileName"));
    }

    let rows = download_repo::query_export(db, filter)?;
    if rows.is_empty() {
        return Err(ExportError::NoRecords);
    }

    let content = render_csv(&rows)?;
    let record_count = rows.len() as u64;
    download_repo::insert(db, file_name, record_count, filter, created_by)?;
    info!(file_name, record_count, "Exported records");

    Ok(ExportFile {
        file_name: file_name.to_string(),
        record_count,
        content,
    })
}

/// Replays a past export's filters against current data. No history entry is
/// written and an empty result still renders the header.
pub fn redownload(db: &Database, id: i64) -> Result<ExportFile, ExportError> {
    let entry = download_repo::find_by_id(db, id)?.ok_or(ExportError::NotFound(id))?;
    let rows = download_repo::query_export(db, &entry.filters)?;
    Ok(ExportFile {
        file_name: entry.file_name,
        record_count: rows.len() as u64,
        content: render_csv(&rows)?,
    })
}

pub fn history(db: &Database, limit: u64) -> Result<Vec<DownloadRow>, ExportError> {
    Ok(download_repo::history(db, limit)?)
}

pub fn delete(db: &Database, id: i64) -> Result<bool, ExportError> {
    Ok(download_repo::delete(db, id)?)
}

/// Renders rows under the fixed export header.
pub fn render_csv(rows: &[MasterRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ContactColumn::EXPORT.iter().map(|c| c.as_str()))?;
    for row in rows {
        writer.write_record(
            ContactColumn::EXPORT
                .iter()
                .map(|c| row.column(*c).unwrap_or_default()),
        )?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Render(e.to_string()))
}
