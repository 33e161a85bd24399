//! Test harness for isolated ingestion runs.
//!
//! The `TestHarness` owns a temporary directory holding a file-backed
//! database and an upload directory, so every test starts from empty storage.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::TempDir;

use leadbook::config::IngestConfig;
use leadbook::db::upload_repo::UploadRow;
use leadbook::db::{master_repo, DatabaseError};
use leadbook::ingest::{IngestReport, IngestRequest, IngestSource, Ingestor};
use leadbook::{CanonicalRecord, ContactStore, Database, UploadStaging, UploadTracker};

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub upload_dir: PathBuf,
    pub ingest: IngestConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_ingest_config(IngestConfig::default())
    }

    pub fn with_ingest_config(ingest: IngestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(&temp_dir.path().join("data").join("leadbook.db"))
            .expect("Failed to open database");
        let upload_dir = temp_dir.path().join("uploads");

        Self {
            temp_dir,
            db,
            upload_dir,
            ingest,
        }
    }

    pub fn staging(&self) -> UploadStaging {
        UploadStaging::new(&self.upload_dir, 10 * 1024 * 1024)
    }

    /// Ingests CSV text through the database-backed store and tracker.
    pub fn ingest(
        &self,
        content: &str,
        vendor: &str,
        mapping: BTreeMap<String, String>,
    ) -> IngestReport {
        self.ingest_with(&self.db, content, vendor, mapping)
    }

    /// Ingests through a caller-supplied store, tracking on the harness database.
    pub fn ingest_with(
        &self,
        store: &dyn ContactStore,
        content: &str,
        vendor: &str,
        mapping: BTreeMap<String, String>,
    ) -> IngestReport {
        let ingestor = Ingestor::new(store, &self.db, self.ingest.clone());
        ingestor
            .run(IngestRequest {
                filename: "leads.csv".to_string(),
                vendor_name: vendor.to_string(),
                source: IngestSource::Content(content.to_string()),
                mapping: Some(mapping),
            })
            .expect("Ingest should create a job")
    }

    pub fn job(&self, id: i64) -> UploadRow {
        self.db
            .get(id)
            .expect("Failed to load upload job")
            .expect("Upload job should exist")
    }

    pub fn master_count(&self) -> u64 {
        leadbook::db::stats_repo::total_records(&self.db).expect("Failed to count rows")
    }

    pub fn seed_contact(&self, record: &CanonicalRecord, vendor: &str) -> i64 {
        master_repo::insert(&self.db, record, vendor).expect("Failed to seed contact")
    }
}

/// Store that forwards to a database while recording duplicate lookups.
pub struct RecordingStore {
    inner: Database,
    lookups: Mutex<Vec<HashSet<String>>>,
}

impl RecordingStore {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Phone sets passed to `find_phones_in`, in call order.
    pub fn lookups(&self) -> Vec<HashSet<String>> {
        self.lookups.lock().unwrap().clone()
    }
}

impl ContactStore for RecordingStore {
    fn insert_contact(
        &self,
        record: &CanonicalRecord,
        vendor_name: &str,
    ) -> Result<i64, DatabaseError> {
        self.inner.insert_contact(record, vendor_name)
    }

    fn find_phones_in(&self, phones: &HashSet<String>) -> Result<HashSet<String>, DatabaseError> {
        self.lookups.lock().unwrap().push(phones.clone());
        self.inner.find_phones_in(phones)
    }
}
