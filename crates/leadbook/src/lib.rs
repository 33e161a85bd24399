pub mod config;
pub mod contact;
pub mod dashboard;
pub mod db;
pub mod dispositions;
pub mod error;
pub mod export;
pub mod ingest;
pub mod records;
pub mod staging;
pub mod store;

pub use config::{load_config, Config, IngestConfig, UploadsConfig};
pub use contact::{normalize_phone, CanonicalRecord, ContactColumn};
pub use db::{Database, DatabaseError};
pub use error::{
    ConfigError, DispositionError, ExportError, LeadbookError, Result, StagingError,
};
pub use ingest::{FieldMapping, IngestError, IngestReport, IngestRequest, IngestSource, Ingestor};
pub use staging::{StagedUpload, UploadPreview, UploadStaging};
pub use store::{ContactStore, UploadTracker};
