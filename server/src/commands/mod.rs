//! HTTP handlers for the leadbook API.
//!
//! Handlers are organized by domain:
//! - `dashboard`: aggregate counters
//! - `upload`: staging, preview and ingestion of vendor CSV files
//! - `records`: browsing and deleting stored contacts
//! - `dispositions`: disposition import and maintenance
//! - `downloads`: filtered CSV export and download history

pub mod dashboard;
pub mod dispositions;
pub mod downloads;
pub mod records;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use leadbook::{
    DispositionError, ExportError, IngestError, LeadbookError, StagingError,
};

use crate::state::AppState;

/// Multipart framing on top of the raw file size.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Response wrapper for API calls.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error returned by handlers, rendered as an `ApiResponse` with a status code.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => {
                error!("Request failed: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

impl From<LeadbookError> for ApiError {
    fn from(err: LeadbookError) -> Self {
        let message = err.to_string();
        let client_error = match &err {
            LeadbookError::Ingest(e) => !matches!(
                e,
                IngestError::Store(_) | IngestError::ReadFile { .. }
            ),
            LeadbookError::Staging(StagingError::NotFound(_)) => {
                return ApiError::NotFound(message)
            }
            LeadbookError::Staging(e) => matches!(
                e,
                StagingError::InvalidId(_) | StagingError::TooLarge { .. } | StagingError::Read(_)
            ),
            LeadbookError::Disposition(e) => !matches!(e, DispositionError::Database(_)),
            LeadbookError::Export(ExportError::NotFound(_)) => {
                return ApiError::NotFound(message)
            }
            LeadbookError::Export(e) => {
                matches!(e, ExportError::MissingField(_) | ExportError::NoRecords)
            }
            LeadbookError::Config(_) | LeadbookError::Database(_) => false,
        };

        if client_error {
            ApiError::BadRequest(message)
        } else {
            ApiError::Internal(message)
        }
    }
}

/// Runs synchronous core work off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, LeadbookError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Background task failed: {}", e)))?
        .map_err(ApiError::from)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<ApiResponse<Health>> {
    Json(ApiResponse::ok(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.uploads.max_file_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/dashboard/vendors", get(dashboard::vendors))
        .route("/api/dashboard/geography", get(dashboard::geography))
        .route(
            "/api/uploads",
            post(upload::upload_csv).get(upload::list_uploads),
        )
        .route("/api/uploads/process-mapping", post(upload::process_mapping))
        .route("/api/uploads/{id}", get(upload::get_upload))
        .route("/api/records", get(records::list_records))
        .route(
            "/api/records/{id}",
            get(records::get_record).delete(records::delete_record),
        )
        .route(
            "/api/dispositions",
            delete(dispositions::delete_dispositions),
        )
        .route("/api/dispositions/types", get(dispositions::types))
        .route("/api/dispositions/stats", get(dispositions::stats))
        .route("/api/dispositions/upload", post(dispositions::upload))
        .route(
            "/api/downloads",
            post(downloads::create_download).get(downloads::history),
        )
        .route("/api/downloads/{id}", delete(downloads::delete_download))
        .route("/api/downloads/{id}/file", get(downloads::redownload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        let (status, body) = app.json(get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[test]
    fn test_error_mapping() {
        use super::ApiError;
        use leadbook::{ExportError, IngestError, LeadbookError};

        let missing = ApiError::from(LeadbookError::Ingest(IngestError::MissingField("vendorName")));
        assert!(matches!(missing, ApiError::BadRequest(_)));

        let not_found = ApiError::from(LeadbookError::Export(ExportError::NotFound(3)));
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let internal = ApiError::from(LeadbookError::Database(
            leadbook::DatabaseError::LockPoisoned,
        ));
        assert!(matches!(internal, ApiError::Internal(_)));
    }
}
