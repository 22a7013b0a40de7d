use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_date, parse_id, validate_date_range};
use super::{ApiError, ApiResponse, AppState, DailyLogDetail, DateRangeQuery, MessageResponse};
use crate::domain::DailyLogId;
use crate::services::{AuthUser, DailyLogDto};

#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<DailyLogDto>>>, ApiError> {
    let range = validate_date_range(query.start, query.end)?;
    let logs = state.shared.daily_logs.get_logs_between(user.id, range).await?;
    Ok(Json(ApiResponse::success(logs)))
}

/// POST /logs
/// Creates the log for a date (today by default) or updates its notes.
pub async fn create_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateLogRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DailyLogDto>>), ApiError> {
    let date = payload.date.unwrap_or_else(|| Local::now().date_naive());
    let log = state
        .shared
        .daily_logs
        .create_or_update(user.id, date, payload.notes.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(log))))
}

/// GET /logs/{date}
pub async fn get_log_by_date(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(raw_date): Path<String>,
) -> Result<Json<ApiResponse<DailyLogDetail>>, ApiError> {
    let date = parse_date(&raw_date)?;
    let daily_log = state
        .shared
        .daily_logs
        .get_by_date(user.id, date)
        .await?
        .ok_or_else(|| ApiError::not_found("Daily log for", date))?;

    let meals = state.shared.meals.list_meals(user.id, daily_log.id).await?;

    Ok(Json(ApiResponse::success(DailyLogDetail { daily_log, meals })))
}

pub async fn update_notes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(payload): Json<UpdateNotesRequest>,
) -> Result<Json<ApiResponse<DailyLogDto>>, ApiError> {
    let id: DailyLogId = parse_id(&raw_id, "daily log")?;
    let log = state
        .shared
        .daily_logs
        .update_notes(user.id, id, payload.notes.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(log)))
}

pub async fn delete_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id: DailyLogId = parse_id(&raw_id, "daily log")?;
    state.shared.daily_logs.delete(user.id, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Daily log deleted",
    ))))
}
