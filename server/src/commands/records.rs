//! Browsing and deleting stored contacts.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use leadbook::db::master_repo::{MasterFilter, MasterRow};
use leadbook::records::{self, RecordPage};

use super::{blocking, ApiError, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    pub search: Option<String>,
    pub vendor: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl From<RecordsQuery> for MasterFilter {
    fn from(q: RecordsQuery) -> Self {
        MasterFilter {
            search: q.search,
            vendor: q.vendor.filter(|v| !v.is_empty()),
            region: q.region.filter(|v| !v.is_empty()),
            state: q.state.filter(|v| !v.is_empty()),
            page: q.page,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub id: i64,
}

pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<ApiResponse<RecordPage>>, ApiError> {
    let db = state.db.clone();
    let filter = MasterFilter::from(query);
    let page = blocking(move || Ok(records::list(&db, &filter)?)).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MasterRow>>, ApiError> {
    let db = state.db.clone();
    match blocking(move || Ok(records::get(&db, id)?)).await? {
        Some(row) => Ok(Json(ApiResponse::ok(row))),
        None => Err(ApiError::NotFound(format!("Record not found: {}", id))),
    }
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Deleted>>, ApiError> {
    let db = state.db.clone();
    if blocking(move || Ok(records::delete(&db, id)?)).await? {
        Ok(Json(ApiResponse::ok(Deleted { id })))
    } else {
        Err(ApiError::NotFound(format!("Record not found: {}", id)))
    }
}
