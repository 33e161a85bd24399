//! Paginated access to stored contact rows.

use serde::Serialize;

use crate::db::master_repo::{self, MasterFilter, MasterRow};
use crate::db::{Database, DatabaseError};

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub records: Vec<MasterRow>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

pub fn list(db: &Database, filter: &MasterFilter) -> Result<RecordPage, DatabaseError> {
    let page = filter.page.unwrap_or(1).max(1);
    let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let normalized = MasterFilter {
        page: Some(page),
        limit: Some(limit),
        search: filter.search.clone().filter(|s| !s.trim().is_empty()),
        ..filter.clone()
    };

    let (records, total) = master_repo::query(db, &normalized)?;
    Ok(RecordPage {
        records,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    })
}

pub fn get(db: &Database, id: i64) -> Result<Option<MasterRow>, DatabaseError> {
    master_repo::find_by_id(db, id)
}

pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    master_repo::delete(db, id)
}
