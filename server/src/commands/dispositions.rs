//! Disposition import and maintenance.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use leadbook::db::disposition_repo::{DispositionStat, DispositionType};
use leadbook::dispositions::{self, ImportReport};

use super::{blocking, ApiError, ApiResponse};
use crate::state::AppState;

const DEFAULT_CREATED_BY: &str = "system";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default)]
    pub phone_numbers: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted: usize,
}

pub async fn types(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<DispositionType>>>, ApiError> {
    let db = state.db.clone();
    let types = blocking(move || Ok(dispositions::types(&db)?)).await?;
    Ok(Json(ApiResponse::ok(types)))
}

pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<DispositionStat>>>, ApiError> {
    let db = state.db.clone();
    let stats = blocking(move || Ok(dispositions::stats(&db)?)).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// Imports a disposition CSV (`phone_number`, `disposition_type`, optional `notes`).
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    let mut content = None;
    let mut created_by = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("csvFile") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                    ApiError::BadRequest("CSV file is not valid UTF-8".to_string())
                })?;
                content = Some(text);
            }
            Some("createdBy") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                created_by = Some(text);
            }
            _ => {}
        }
    }

    let content =
        content.ok_or_else(|| ApiError::BadRequest("Missing required field: csvFile".to_string()))?;
    let created_by = created_by
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CREATED_BY.to_string());

    let db = state.db.clone();
    let report = blocking(move || Ok(dispositions::import(&db, &content, &created_by)?)).await?;
    Ok(Json(ApiResponse::ok(report)))
}

pub async fn delete_dispositions(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let db = state.db.clone();
    let deleted =
        blocking(move || Ok(dispositions::delete(&db, &request.phone_numbers)?)).await?;
    Ok(Json(ApiResponse::ok(DeleteResponse { deleted })))
}
