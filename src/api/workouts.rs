use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_id, validate_date_range};
use super::{ApiError, ApiResponse, AppState, DateRangeQuery, MessageResponse};
use crate::domain::WorkoutId;
use crate::services::{AuthUser, NewWorkout, WorkoutDto, WorkoutUpdate, WorkoutWrite};

#[derive(Debug, Default, Deserialize)]
pub struct EstimateQuery {
    #[serde(default)]
    pub auto_estimate: bool,
}

pub async fn list_workouts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<WorkoutDto>>>, ApiError> {
    let range = validate_date_range(query.start, query.end)?;
    let workouts = state.shared.workouts.find_workouts(user.id, range).await?;
    Ok(Json(ApiResponse::success(workouts)))
}

pub async fn add_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<EstimateQuery>,
    Json(payload): Json<NewWorkout>,
) -> Result<(StatusCode, Json<ApiResponse<WorkoutWrite>>), ApiError> {
    let written = state
        .shared
        .workouts
        .add_workout(user.id, payload, query.auto_estimate)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(written))))
}

pub async fn update_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Query(query): Query<EstimateQuery>,
    Json(payload): Json<WorkoutUpdate>,
) -> Result<Json<ApiResponse<WorkoutWrite>>, ApiError> {
    let id: WorkoutId = parse_id(&raw_id, "workout")?;
    let written = state
        .shared
        .workouts
        .update_workout(user.id, id, payload, query.auto_estimate)
        .await?;
    Ok(Json(ApiResponse::success(written)))
}

pub async fn delete_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id: WorkoutId = parse_id(&raw_id, "workout")?;
    state.shared.workouts.delete_workout(user.id, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Workout deleted",
    ))))
}
