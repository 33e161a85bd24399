use std::path::PathBuf;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("CSV file is empty")]
    EmptyInput,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid mapping for '{source_field}': unknown column '{column}'")]
    InvalidMapping { source_field: String, column: String },

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File is not valid UTF-8")]
    InvalidEncoding,

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row store error: {0}")]
    Store(#[from] DatabaseError),
}
