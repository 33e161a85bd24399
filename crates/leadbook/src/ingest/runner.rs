use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::IngestConfig;
use crate::contact::CanonicalRecord;
use crate::db::upload_repo::{NewUpload, UploadStatus, UploadUpdate};
use crate::store::{ContactStore, UploadTracker};

use super::duplicates;
use super::error::IngestError;
use super::mapping::{self, FieldMapping};
use super::reader::{self, ParsedCsv, RawRecord};

/// Where the CSV content comes from.
#[derive(Debug, Clone)]
pub enum IngestSource {
    Path(PathBuf),
    Content(String),
}

/// One ingestion run.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Original file name, recorded on the upload job.
    pub filename: String,
    pub vendor_name: String,
    pub source: IngestSource,
    /// Header → column map; `None` maps headers that already name a column.
    pub mapping: Option<BTreeMap<String, String>>,
}

/// Outcome of a run that got as far as creating its upload job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub upload_id: i64,
    pub status: UploadStatus,
    pub total_records: u64,
    pub successful_records: u64,
    pub duplicates_count: u64,
    pub failed_records: u64,
    pub error_message: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    successful: u64,
    duplicates: u64,
    failed: u64,
}

impl Tally {
    fn processed(&self) -> u64 {
        self.successful + self.duplicates + self.failed
    }

    fn snapshot(&self) -> UploadUpdate {
        UploadUpdate {
            successful_records: Some(self.successful),
            duplicates_count: Some(self.duplicates),
            failed_records: Some(self.failed),
            ..Default::default()
        }
    }
}

/// Streams a CSV file into the row store in batches, tracking progress on an
/// upload job.
pub struct Ingestor<'a> {
    store: &'a dyn ContactStore,
    tracker: &'a dyn UploadTracker,
    config: IngestConfig,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        store: &'a dyn ContactStore,
        tracker: &'a dyn UploadTracker,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            tracker,
            config,
        }
    }

    /// Runs one upload end to end.
    ///
    /// Validation problems (missing vendor or file name, a mapping naming an
    /// unknown column) and a failure to create the job are returned as `Err`
    /// and leave no job behind. Once the job exists every outcome is an
    /// `Ok` report: `completed` with final counts, or `failed` with the
    /// error message.
    pub fn run(&self, request: IngestRequest) -> Result<IngestReport, IngestError> {
        let vendor_name = request.vendor_name.trim().to_string();
        if vendor_name.is_empty() {
            return Err(IngestError::MissingField("vendorName"));
        }
        if request.filename.trim().is_empty() {
            return Err(IngestError::MissingField("csvFile"));
        }
        let explicit = request
            .mapping
            .as_ref()
            .map(FieldMapping::from_map)
            .transpose()?;

        let upload_id = self.tracker.create(&NewUpload {
            filename: request.filename.clone(),
            vendor_name: vendor_name.clone(),
            mapping: request.mapping.clone(),
        })?;

        let _run_span = info_span!("ingest",
            upload_id,
            filename = %request.filename,
            vendor = %vendor_name,
        )
        .entered();

        match self.ingest(upload_id, &request.source, explicit, &vendor_name) {
            Ok((total, tally)) => {
                self.track(
                    upload_id,
                    &UploadUpdate {
                        status: Some(UploadStatus::Completed),
                        ..tally.snapshot()
                    },
                );
                info!(
                    total,
                    successful = tally.successful,
                    duplicates = tally.duplicates,
                    failed = tally.failed,
                    "Upload completed"
                );
                Ok(IngestReport {
                    upload_id,
                    status: UploadStatus::Completed,
                    total_records: total,
                    successful_records: tally.successful,
                    duplicates_count: tally.duplicates,
                    failed_records: tally.failed,
                    error_message: None,
                })
            }
            Err((e, total, tally)) => {
                let message = e.to_string();
                warn!(error = %message, "Upload failed");
                self.track(
                    upload_id,
                    &UploadUpdate {
                        status: Some(UploadStatus::Failed),
                        error_message: Some(message.clone()),
                        ..Default::default()
                    },
                );
                Ok(IngestReport {
                    upload_id,
                    status: UploadStatus::Failed,
                    total_records: total,
                    successful_records: tally.successful,
                    duplicates_count: tally.duplicates,
                    failed_records: tally.failed,
                    error_message: Some(message),
                })
            }
        }
    }

    /// Parses and ingests; on a fatal error also hands back the progress made.
    fn ingest(
        &self,
        upload_id: i64,
        source: &IngestSource,
        explicit: Option<FieldMapping>,
        vendor_name: &str,
    ) -> Result<(u64, Tally), (IngestError, u64, Tally)> {
        let parsed = {
            let _step = info_span!("parse").entered();
            parse_source(source).map_err(|e| (e, 0, Tally::default()))?
        };
        let total = parsed.records.len() as u64;
        let mapping = explicit.unwrap_or_else(|| FieldMapping::identity(&parsed.headers));
        debug!(total, mapped_fields = mapping.len(), "Parsed upload");

        self.track(
            upload_id,
            &UploadUpdate {
                total_records: Some(total),
                headers: Some(parsed.headers.clone()),
                ..Default::default()
            },
        );

        let mut tally = Tally::default();
        let batch_size = self.config.batch_size.max(1);
        for (index, batch) in parsed.records.chunks(batch_size).enumerate() {
            let _batch_span = info_span!("batch", index, size = batch.len()).entered();
            self.ingest_batch(upload_id, batch, &mapping, vendor_name, &mut tally)
                .map_err(|e| (e, total, tally))?;
        }

        Ok((total, tally))
    }

    fn ingest_batch(
        &self,
        upload_id: i64,
        batch: &[RawRecord],
        mapping: &FieldMapping,
        vendor_name: &str,
        tally: &mut Tally,
    ) -> Result<(), IngestError> {
        let canonical: Vec<CanonicalRecord> = batch
            .iter()
            .map(|raw| {
                let mut record = mapping.apply(raw);
                if self.config.normalize_phones {
                    mapping::normalize_phones(&mut record);
                }
                record
            })
            .collect();

        let phones = duplicates::collect_phones(&canonical);
        let existing = duplicates::find_existing(self.store, &phones)?;

        let interval = self.config.progress_interval.max(1) as u64;
        for record in &canonical {
            if duplicates::is_duplicate(record, &existing) {
                tally.duplicates += 1;
            } else {
                match self.store.insert_contact(record, vendor_name) {
                    Ok(_) => tally.successful += 1,
                    Err(e) => {
                        tally.failed += 1;
                        warn!(record = tally.processed(), error = %e, "Failed to insert record");
                    }
                }
            }

            if tally.processed() % interval == 0 {
                self.track(upload_id, &tally.snapshot());
            }
        }

        Ok(())
    }

    /// Tracker failures are logged and never abort the run.
    fn track(&self, upload_id: i64, changes: &UploadUpdate) {
        if let Err(e) = self.tracker.update(upload_id, changes) {
            warn!(upload_id, error = %e, "Failed to update upload job");
        }
    }
}

fn parse_source(source: &IngestSource) -> Result<ParsedCsv, IngestError> {
    match source {
        IngestSource::Path(path) => reader::read_path(path),
        IngestSource::Content(content) => reader::parse(content),
    }
}
