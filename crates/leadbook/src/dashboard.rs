use serde::Serialize;

use crate::db::stats_repo::{self, GeographyView, LabelCount};
use crate::db::{disposition_repo, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_records: u64,
    pub active_vendors: u64,
    pub dispositions_today: u64,
    pub duplicate_rate: f64,
}

pub fn stats(db: &Database) -> Result<DashboardStats, DatabaseError> {
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    Ok(DashboardStats {
        total_records: stats_repo::total_records(db)?,
        active_vendors: stats_repo::active_vendors(db)?,
        dispositions_today: disposition_repo::count_on_date(db, &today)?,
        duplicate_rate: stats_repo::duplicate_rate(db)?,
    })
}

pub fn vendors(db: &Database) -> Result<Vec<LabelCount>, DatabaseError> {
    stats_repo::vendor_counts(db)
}

pub fn geography(db: &Database, view: GeographyView) -> Result<Vec<LabelCount>, DatabaseError> {
    stats_repo::geography_counts(db, view)
}
