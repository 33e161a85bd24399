//! Filtered CSV export and download history.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use leadbook::db::download_repo::{DownloadRow, ExportFilter};
use leadbook::export::{self, ExportFile};

use super::{blocking, ApiError, ApiResponse};
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: u64 = 50;
const DEFAULT_CREATED_BY: &str = "system";

const RECORD_COUNT: &str = "x-record-count";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadRequest {
    pub file_name: String,
    pub created_by: Option<String>,
    #[serde(flatten)]
    pub filter: ExportFilter,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub id: i64,
}

/// Keeps the suggested download name to a safe character set.
fn attachment_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.to_ascii_lowercase().ends_with(".csv") {
        cleaned
    } else {
        format!("{}.csv", cleaned)
    }
}

fn csv_response(file: ExportFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", attachment_name(&file.file_name));
    let mut response = file.content.into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    headers.insert(RECORD_COUNT, HeaderValue::from(file.record_count));
    response
}

pub async fn create_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let created_by = request
        .created_by
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CREATED_BY.to_string());
    let file = blocking(move || {
        Ok(export::export(
            &db,
            &request.file_name,
            &request.filter,
            &created_by,
        )?)
    })
    .await?;
    Ok(csv_response(file))
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<DownloadRow>>>, ApiError> {
    let db = state.db.clone();
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let entries = blocking(move || Ok(export::history(&db, limit)?)).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

pub async fn redownload(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let db = state.db.clone();
    let file = blocking(move || Ok(export::redownload(&db, id)?)).await?;
    Ok(csv_response(file))
}

pub async fn delete_download(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Deleted>>, ApiError> {
    let db = state.db.clone();
    if blocking(move || Ok(export::delete(&db, id)?)).await? {
        Ok(Json(ApiResponse::ok(Deleted { id })))
    } else {
        Err(ApiError::NotFound(format!("Download not found: {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::attachment_name;
    use crate::commands::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use leadbook::db::master_repo;
    use leadbook::{CanonicalRecord, ContactColumn};
    use serde_json::json;

    fn seed(app: &TestApp, first: &str, phone: &str, zip: &str) {
        let mut record = CanonicalRecord::new();
        record.set(ContactColumn::FirstName, first);
        record.set(ContactColumn::Phone1, phone);
        record.set(ContactColumn::Zipcode, zip);
        master_repo::insert(&app.state.db, &record, "Acme").unwrap();
    }

    #[test]
    fn test_attachment_name() {
        assert_eq!(attachment_name("leads.csv"), "leads.csv");
        assert_eq!(attachment_name("my leads"), "my_leads.csv");
        assert_eq!(attachment_name("a\"b.CSV"), "a_b.CSV");
    }

    #[tokio::test]
    async fn test_create_history_redownload_delete() {
        let app = TestApp::new();
        seed(&app, "Ann", "5550001111", "89501");
        seed(&app, "Bo", "5550002222", "89502");

        let request = json_request(
            "POST",
            "/api/downloads",
            json!({ "fileName": "reno leads", "zipCodes": ["89501"] }),
        );
        let response = {
            use tower::ServiceExt;
            app.router.clone().oneshot(request).await.unwrap()
        };
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-record-count"], "1");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"reno_leads.csv\""
        );

        let (_, body) = app.json(get("/api/downloads")).await;
        let id = body["data"][0]["id"].as_i64().unwrap();
        assert_eq!(body["data"][0]["recordCount"], 1);
        assert_eq!(body["data"][0]["filters"]["zipCodes"], json!(["89501"]));

        let (status, bytes) = app.send(get(&format!("/api/downloads/{}/file", id))).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Ann"));
        assert!(!text.contains("Bo,"));

        let delete = Request::delete(format!("/api/downloads/{}", id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.json(delete).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.send(get(&format!("/api/downloads/{}/file", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_download_without_matches() {
        let app = TestApp::new();
        let (status, body) = app
            .json(json_request(
                "POST",
                "/api/downloads",
                json!({ "fileName": "none.csv", "zipCodes": ["00000"] }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = app
            .json(json_request("POST", "/api/downloads", json!({ "zipCodes": [] })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
