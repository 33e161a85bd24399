//! Dashboard counters.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use leadbook::dashboard::{self, DashboardStats};
use leadbook::db::stats_repo::{GeographyView, LabelCount};

use super::{blocking, ApiError, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GeographyQuery {
    pub view: Option<String>,
}

pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    let db = state.db.clone();
    let stats = blocking(move || Ok(dashboard::stats(&db)?)).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn vendors(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LabelCount>>>, ApiError> {
    let db = state.db.clone();
    let vendors = blocking(move || Ok(dashboard::vendors(&db)?)).await?;
    Ok(Json(ApiResponse::ok(vendors)))
}

pub async fn geography(
    State(state): State<AppState>,
    Query(query): Query<GeographyQuery>,
) -> Result<Json<ApiResponse<Vec<LabelCount>>>, ApiError> {
    let view = match query.view.as_deref() {
        Some(raw) => raw.parse::<GeographyView>().map_err(ApiError::BadRequest)?,
        None => GeographyView::default(),
    };
    let db = state.db.clone();
    let counts = blocking(move || Ok(dashboard::geography(&db, view)?)).await?;
    Ok(Json(ApiResponse::ok(counts)))
}

#[cfg(test)]
mod tests {
    use crate::commands::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_stats_on_empty_database() {
        let app = TestApp::new();
        let (status, body) = app.json(get("/api/dashboard/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalRecords"], 0);
        assert_eq!(body["data"]["duplicateRate"], 0.0);
    }

    #[tokio::test]
    async fn test_geography_rejects_unknown_view() {
        let app = TestApp::new();
        let (status, body) = app.json(get("/api/dashboard/geography?view=planet")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = app.json(get("/api/dashboard/geography?view=state")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
