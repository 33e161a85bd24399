use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadbookError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] crate::ingest::IngestError),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Disposition error: {0}")]
    Disposition(#[from] DispositionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("Invalid file id: {0}")]
    InvalidId(String),

    #[error("Uploaded file not found: {0}")]
    NotFound(String),

    #[error("Failed to read staged file: {0}")]
    Read(#[source] crate::ingest::IngestError),
}

#[derive(Error, Debug)]
pub enum DispositionError {
    #[error("CSV file is empty")]
    EmptyInput,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid disposition type '{value}' on row {row}")]
    InvalidDispositionType { row: usize, value: String },

    #[error("Invalid phone number '{value}' on row {row}")]
    InvalidPhone { row: usize, value: String },

    #[error("No phone numbers provided")]
    NoPhoneNumbers,

    #[error("Failed to parse CSV: {0}")]
    Parse(String),

    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("No records found matching the selected filters")]
    NoRecords,

    #[error("Download not found: {0}")]
    NotFound(i64),

    #[error("Failed to render CSV: {0}")]
    Render(String),

    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Render(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LeadbookError>;
