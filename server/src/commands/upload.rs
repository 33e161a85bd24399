//! Vendor CSV staging, preview and ingestion.

use std::collections::BTreeMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use leadbook::db::upload_repo::{UploadRow, UploadStatus};
use leadbook::{IngestReport, Ingestor, LeadbookError, UploadPreview, UploadTracker};

use super::{blocking, ApiError, ApiResponse};
use crate::state::AppState;

const DEFAULT_FILENAME: &str = "upload.csv";
const DEFAULT_LIST_LIMIT: u64 = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub vendor_name: String,
    #[serde(flatten)]
    pub preview: UploadPreview,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessMappingRequest {
    pub file_id: String,
    pub vendor_name: String,
    pub mapping: Option<BTreeMap<String, String>>,
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Stages an uploaded vendor file and returns its preview.
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let mut vendor_name = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("vendorName") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                vendor_name = Some(text);
            }
            Some("csvFile") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                file = Some((filename, bytes));
            }
            _ => {}
        }
    }

    let vendor_name = vendor_name
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: vendorName".to_string()))?;
    let (filename, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing required field: csvFile".to_string()))?;

    let staging = state.staging.clone();
    let rows = state.config.uploads.preview_rows;
    let preview = blocking(move || {
        let staged = staging.stage(&bytes)?;
        match staging.preview(&staged.id, &filename, rows) {
            Ok(preview) => Ok(preview),
            Err(e) => {
                staging.remove(&staged.id);
                Err(LeadbookError::from(e))
            }
        }
    })
    .await?;

    info!(file_id = %preview.file_id, vendor = %vendor_name, "Staged upload");
    Ok(Json(ApiResponse::ok(UploadResponse {
        vendor_name,
        preview,
    })))
}

/// Ingests a staged file with the confirmed mapping.
///
/// A job that fails after creation answers 422 with the report attached.
pub async fn process_mapping(
    State(state): State<AppState>,
    Json(request): Json<ProcessMappingRequest>,
) -> Result<Response, ApiError> {
    let file_id = request.file_id.trim().to_string();
    if file_id.is_empty() {
        return Err(ApiError::BadRequest("Missing required field: fileId".to_string()));
    }

    let db = state.db.clone();
    let staging = state.staging.clone();
    let ingest_config = state.config.ingest.clone();
    let filename = request
        .file_name
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    let report: IngestReport = blocking(move || {
        let ingestor = Ingestor::new(&db, &db, ingest_config);
        staging.ingest_staged(
            &ingestor,
            &file_id,
            &filename,
            &request.vendor_name,
            request.mapping,
        )
    })
    .await?;

    if report.status == UploadStatus::Failed {
        let body = ApiResponse {
            success: false,
            error: report.error_message.clone(),
            data: Some(report),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response());
    }
    Ok(Json(ApiResponse::ok(report)).into_response())
}

pub async fn list_uploads(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<UploadRow>>>, ApiError> {
    let db = state.db.clone();
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let jobs = blocking(move || Ok(db.list(limit, offset)?)).await?;
    Ok(Json(ApiResponse::ok(jobs)))
}

pub async fn get_upload(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UploadRow>>, ApiError> {
    let db = state.db.clone();
    match blocking(move || Ok(db.get(id)?)).await? {
        Some(job) => Ok(Json(ApiResponse::ok(job))),
        None => Err(ApiError::NotFound(format!("Upload not found: {}", id))),
    }
}
