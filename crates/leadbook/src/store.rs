//! Storage capabilities the ingestor depends on.
//!
//! The ingestor only sees these traits, so tests can wrap or replace the
//! SQLite-backed [`Database`] implementation.

use std::collections::HashSet;

use crate::contact::CanonicalRecord;
use crate::db::upload_repo::{self, NewUpload, UploadRow, UploadUpdate};
use crate::db::{master_repo, Database, DatabaseError};

/// Row store for contact records.
pub trait ContactStore: Send + Sync {
    /// Persists one record tagged with the vendor, returning its id.
    fn insert_contact(&self, record: &CanonicalRecord, vendor_name: &str)
        -> Result<i64, DatabaseError>;

    /// Returns the subset of `phones` already present in any phone slot.
    fn find_phones_in(&self, phones: &HashSet<String>) -> Result<HashSet<String>, DatabaseError>;
}

/// Lifecycle bookkeeping for upload jobs.
pub trait UploadTracker: Send + Sync {
    fn create(&self, upload: &NewUpload) -> Result<i64, DatabaseError>;

    fn update(&self, id: i64, changes: &UploadUpdate) -> Result<(), DatabaseError>;

    fn get(&self, id: i64) -> Result<Option<UploadRow>, DatabaseError>;

    fn list(&self, limit: u64, offset: u64) -> Result<Vec<UploadRow>, DatabaseError>;
}

impl ContactStore for Database {
    fn insert_contact(
        &self,
        record: &CanonicalRecord,
        vendor_name: &str,
    ) -> Result<i64, DatabaseError> {
        master_repo::insert(self, record, vendor_name)
    }

    fn find_phones_in(&self, phones: &HashSet<String>) -> Result<HashSet<String>, DatabaseError> {
        master_repo::find_phones_in(self, phones)
    }
}

impl UploadTracker for Database {
    fn create(&self, upload: &NewUpload) -> Result<i64, DatabaseError> {
        upload_repo::insert(self, upload)
    }

    fn update(&self, id: i64, changes: &UploadUpdate) -> Result<(), DatabaseError> {
        upload_repo::update(self, id, changes)
    }

    fn get(&self, id: i64) -> Result<Option<UploadRow>, DatabaseError> {
        upload_repo::find_by_id(self, id)
    }

    fn list(&self, limit: u64, offset: u64) -> Result<Vec<UploadRow>, DatabaseError> {
        upload_repo::list(self, limit, offset)
    }
}
