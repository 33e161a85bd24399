//! Temporary storage for uploaded CSV files between preview and ingestion.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::contact::ContactColumn;
use crate::error::{LeadbookError, StagingError};
use crate::ingest::{reader, FieldMapping, IngestReport, IngestRequest, IngestSource, Ingestor};

/// A file written to the upload directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedUpload {
    pub id: String,
    pub path: PathBuf,
    pub size: u64,
}

/// What the operator sees before choosing a mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPreview {
    pub file_id: String,
    pub filename: String,
    pub headers: Vec<String>,
    pub preview_rows: Vec<BTreeMap<String, String>>,
    pub columns: Vec<&'static str>,
    /// Headers that already name a canonical column.
    pub suggested_mapping: BTreeMap<String, String>,
}

pub struct UploadStaging {
    directory: PathBuf,
    max_file_bytes: u64,
}

impl UploadStaging {
    pub fn new<P: AsRef<Path>>(directory: P, max_file_bytes: u64) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            max_file_bytes,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes `content` as `<uuid>.csv`, creating the directory on demand.
    pub fn stage(&self, content: &[u8]) -> Result<StagedUpload, StagingError> {
        let size = content.len() as u64;
        if size > self.max_file_bytes {
            return Err(StagingError::TooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }

        std::fs::create_dir_all(&self.directory).map_err(|e| StagingError::CreateDirectory {
            path: self.directory.clone(),
            source: e,
        })?;

        let id = Uuid::new_v4().to_string();
        let path = self.file_path(&id);
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| StagingError::WriteFile {
                path: path.clone(),
                source: e,
            })?;
        file.write_all(content).map_err(|e| StagingError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        debug!(file_id = %id, size, "Staged upload");
        Ok(StagedUpload { id, path, size })
    }

    /// Path of a staged file. Only UUIDs are accepted as ids.
    pub fn resolve(&self, id: &str) -> Result<PathBuf, StagingError> {
        let uuid = Uuid::parse_str(id).map_err(|_| StagingError::InvalidId(id.to_string()))?;
        let path = self.file_path(&uuid.to_string());
        if !path.is_file() {
            return Err(StagingError::NotFound(id.to_string()));
        }
        Ok(path)
    }

    /// Deletes a staged file. Failures are logged, never returned.
    pub fn remove(&self, id: &str) {
        let Ok(uuid) = Uuid::parse_str(id) else {
            warn!(file_id = %id, "Refusing to remove file with invalid id");
            return;
        };
        let path = self.file_path(&uuid.to_string());
        if let Err(e) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "Failed to remove staged upload");
        }
    }

    /// Headers, the first `rows` records and the canonical column list.
    pub fn preview(
        &self,
        id: &str,
        filename: &str,
        rows: usize,
    ) -> Result<UploadPreview, StagingError> {
        let path = self.resolve(id)?;
        let content = reader::read_to_string(&path).map_err(StagingError::Read)?;
        let parsed = reader::preview(&content, rows).map_err(StagingError::Read)?;

        let preview_rows = parsed
            .records
            .iter()
            .map(|r| {
                r.iter()
                    .map(|(h, v)| (h.to_string(), v.to_string()))
                    .collect()
            })
            .collect();

        Ok(UploadPreview {
            file_id: id.to_string(),
            filename: filename.to_string(),
            suggested_mapping: FieldMapping::identity(&parsed.headers).to_map(),
            headers: parsed.headers,
            preview_rows,
            columns: ContactColumn::ALL.iter().map(|c| c.as_str()).collect(),
        })
    }

    /// Ingests a staged file, then removes it whatever the outcome.
    pub fn ingest_staged(
        &self,
        ingestor: &Ingestor<'_>,
        id: &str,
        filename: &str,
        vendor_name: &str,
        mapping: Option<BTreeMap<String, String>>,
    ) -> Result<IngestReport, LeadbookError> {
        let path = self.resolve(id)?;
        let result = ingestor.run(IngestRequest {
            filename: filename.to_string(),
            vendor_name: vendor_name.to_string(),
            source: IngestSource::Path(path),
            mapping,
        });
        self.remove(id);
        Ok(result?)
    }

    fn file_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{}.csv", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::db::upload_repo::UploadStatus;
    use crate::db::Database;
    use tempfile::TempDir;

    fn staging(dir: &TempDir) -> UploadStaging {
        UploadStaging::new(dir.path().join("uploads"), 1024)
    }

    #[test]
    fn test_stage_creates_directory_and_file() {
        let dir = TempDir::new().unwrap();
        let staging = staging(&dir);

        let staged = staging.stage(b"Ph\n1\n").unwrap();
        assert!(staged.path.exists());
        assert_eq!(staged.size, 5);
        assert_eq!(staging.resolve(&staged.id).unwrap(), staged.path);
    }

    #[test]
    fn test_stage_rejects_oversized() {
        let dir = TempDir::new().unwrap();
        let staging = UploadStaging::new(dir.path(), 4);
        let result = staging.stage(b"too large");
        assert!(matches!(result, Err(StagingError::TooLarge { size: 9, limit: 4 })));
    }

    #[test]
    fn test_resolve_rejects_non_uuid() {
        let dir = TempDir::new().unwrap();
        let staging = staging(&dir);
        assert!(matches!(
            staging.resolve("../../etc/passwd"),
            Err(StagingError::InvalidId(_))
        ));
        assert!(matches!(
            staging.resolve(&Uuid::new_v4().to_string()),
            Err(StagingError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_missing_file_is_silent() {
        let dir = TempDir::new().unwrap();
        let staging = staging(&dir);
        staging.remove(&Uuid::new_v4().to_string());
        staging.remove("not-a-uuid");
    }

    #[test]
    fn test_preview() {
        let dir = TempDir::new().unwrap();
        let staging = staging(&dir);
        let staged = staging
            .stage(b"first_name,Cell\nAnn,1\nBo,2\nCy,3\n")
            .unwrap();

        let preview = staging.preview(&staged.id, "leads.csv", 2).unwrap();
        assert_eq!(preview.headers, vec!["first_name", "Cell"]);
        assert_eq!(preview.preview_rows.len(), 2);
        assert_eq!(
            preview.preview_rows[1].get("Cell").map(String::as_str),
            Some("2")
        );
        assert_eq!(preview.columns.len(), 15);
        assert_eq!(preview.suggested_mapping.len(), 1);
        assert!(staged.path.exists());
    }

    #[test]
    fn test_ingest_staged_removes_file_on_success_and_failure() {
        let dir = TempDir::new().unwrap();
        let staging = staging(&dir);
        let db = Database::open_in_memory().unwrap();
        let ingestor = Ingestor::new(&db, &db, IngestConfig::default());
        let mapping: BTreeMap<String, String> =
            [("Ph".to_string(), "phone1".to_string())].into_iter().collect();

        let good = staging.stage(b"Ph\n1\n").unwrap();
        let report = staging
            .ingest_staged(&ingestor, &good.id, "good.csv", "Acme", Some(mapping.clone()))
            .unwrap();
        assert_eq!(report.status, UploadStatus::Completed);
        assert!(!good.path.exists());

        let empty = staging.stage(b"Ph\n").unwrap();
        let report = staging
            .ingest_staged(&ingestor, &empty.id, "empty.csv", "Acme", Some(mapping.clone()))
            .unwrap();
        assert_eq!(report.status, UploadStatus::Failed);
        assert!(!empty.path.exists());

        let rejected = staging.stage(b"Ph\n1\n").unwrap();
        let result = staging.ingest_staged(&ingestor, &rejected.id, "r.csv", "", Some(mapping));
        assert!(result.is_err());
        assert!(!rejected.path.exists());
    }
}
