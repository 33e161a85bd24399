//! CSV contact ingestion: read, map, de-duplicate, insert, track.

pub mod duplicates;
pub mod error;
pub mod mapping;
pub mod reader;
pub mod runner;

pub use error::IngestError;
pub use mapping::FieldMapping;
pub use reader::{ParsedCsv, RawRecord};
pub use runner::{IngestReport, IngestRequest, IngestSource, Ingestor};
