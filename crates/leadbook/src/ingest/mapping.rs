//! Mapping of vendor headers onto canonical contact columns.

use std::collections::BTreeMap;

use super::error::IngestError;
use super::reader::RawRecord;
use crate::contact::{normalize_phone, CanonicalRecord, ContactColumn};

/// Validated source field → column pairs.
///
/// Pairs are applied in order, so when two fields target the same column the
/// later non-empty value wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMapping {
    pairs: Vec<(String, ContactColumn)>,
}

impl FieldMapping {
    /// Builds a mapping from the operator's JSON map. Empty targets mean
    /// "unmapped" and are dropped; any other unknown column is rejected.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, IngestError> {
        let mut pairs = Vec::with_capacity(map.len());
        for (source, target) in map {
            if target.trim().is_empty() {
                continue;
            }
            let column = target
                .parse::<ContactColumn>()
                .map_err(|_| IngestError::InvalidMapping {
                    source_field: source.clone(),
                    column: target.clone(),
                })?;
            pairs.push((source.clone(), column));
        }
        Ok(Self { pairs })
    }

    /// Maps every header that already names a canonical column.
    pub fn identity(headers: &[String]) -> Self {
        let pairs = headers
            .iter()
            .filter_map(|h| h.parse::<ContactColumn>().ok().map(|c| (h.clone(), c)))
            .collect();
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Copies mapped, non-empty fields into a canonical record. Unmapped
    /// fields are dropped.
    pub fn apply(&self, record: &RawRecord) -> CanonicalRecord {
        let mut canonical = CanonicalRecord::new();
        for (source, column) in &self.pairs {
            if let Some(value) = record.get(source) {
                if !value.is_empty() {
                    canonical.set(*column, value);
                }
            }
        }
        canonical
    }

    /// The mapping as the string map persisted on the upload job.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.pairs
            .iter()
            .map(|(source, column)| (source.clone(), column.as_str().to_string()))
            .collect()
    }
}

/// Reduces phone columns to their digits. A phone left empty is removed.
pub fn normalize_phones(record: &mut CanonicalRecord) {
    for column in ContactColumn::PHONES {
        let Some(digits) = record.get(column).map(normalize_phone) else {
            continue;
        };
        if digits.is_empty() {
            record.remove(column);
        } else {
            record.set(column, digits);
        }
    }
}
