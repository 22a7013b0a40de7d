use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::parse_id;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::{DailyLogId, MealId};
use crate::services::{AuthUser, DailyLogDto, DatedMeal, MealDto, MealUpdate, MealWrite, NewMeal};

pub async fn list_log_meals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<MealDto>>>, ApiError> {
    let log_id: DailyLogId = parse_id(&raw_id, "daily log")?;
    let meals = state.shared.meals.list_meals(user.id, log_id).await?;
    Ok(Json(ApiResponse::success(meals)))
}

pub async fn add_meal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(payload): Json<NewMeal>,
) -> Result<(StatusCode, Json<ApiResponse<MealWrite>>), ApiError> {
    let log_id: DailyLogId = parse_id(&raw_id, "daily log")?;
    let written = state.shared.meals.add_meal(user.id, log_id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(written))))
}

/// GET /meals
/// Every meal of the caller across all logs.
pub async fn list_user_meals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<DatedMeal>>>, ApiError> {
    let meals = state.shared.meals.list_user_meals(user.id).await?;
    Ok(Json(ApiResponse::success(meals)))
}

pub async fn update_meal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(payload): Json<MealUpdate>,
) -> Result<Json<ApiResponse<MealWrite>>, ApiError> {
    let id: MealId = parse_id(&raw_id, "meal")?;
    let written = state.shared.meals.update_meal(user.id, id, payload).await?;
    Ok(Json(ApiResponse::success(written)))
}

pub async fn delete_meal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<DailyLogDto>>, ApiError> {
    let id: MealId = parse_id(&raw_id, "meal")?;
    let log = state.shared.meals.delete_meal(user.id, id).await?;
    Ok(Json(ApiResponse::success(log)))
}
