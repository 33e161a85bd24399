use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_upload_directory")]
    pub upload_directory: String,
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_database_path() -> String {
    crate::db::default_database_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "leadbook.db".to_string())
}

fn default_upload_directory() -> String {
    dirs::home_dir()
        .map(|h| h.join(".leadbook").join("uploads").display().to_string())
        .unwrap_or_else(|| "uploads".to_string())
}

fn default_listen_address() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database_path: default_database_path(),
            upload_directory: default_upload_directory(),
            listen_address: default_listen_address(),
            ingest: IngestConfig::default(),
            uploads: UploadsConfig::default(),
        }
    }
}

/// Knobs for the batch ingestor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// A progress snapshot is written every this many processed records.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
    /// Reduce phone columns to their digits before duplicate checks and storage.
    #[serde(default = "default_true")]
    pub normalize_phones: bool,
}

fn default_batch_size() -> usize {
    1000
}

fn default_progress_interval() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            progress_interval: default_progress_interval(),
            normalize_phones: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_preview_rows() -> usize {
    5
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            preview_rows: default_preview_rows(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}
