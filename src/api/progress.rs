use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_date_range;
use super::{ApiError, ApiResponse, AppState, DateRangeQuery, ProgressHistoryDto};
use crate::services::progress_service::compute_trend;
use crate::services::{AuthUser, ProgressDto};

#[derive(Debug, Deserialize)]
pub struct AddProgressRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub weight_kg: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// GET /progress
/// History in the range plus its first-to-last trend.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<ProgressHistoryDto>>, ApiError> {
    let range = validate_date_range(query.start, query.end)?;
    let entries = state
        .shared
        .progress
        .get_progress_history(user.id, range)
        .await?;
    let trend = compute_trend(&entries);
    Ok(Json(ApiResponse::success(ProgressHistoryDto { entries, trend })))
}

pub async fn add_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddProgressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProgressDto>>), ApiError> {
    let date = payload.date.unwrap_or_else(|| Local::now().date_naive());
    let entry = state
        .shared
        .progress
        .add_progress(user.id, date, payload.weight_kg, payload.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(entry))))
}
