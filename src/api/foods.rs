use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_id, validate_search_query};
use super::{ApiError, ApiResponse, AppState};
use crate::clients::nutrition::FoodDto;
use crate::services::{AuthUser, FoodCalculation, FoodSearchItem};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CalcRequest {
    pub food_name: String,
    #[serde(default)]
    pub serving_size: Option<String>,
    #[serde(default)]
    pub portions: Option<f64>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<FoodSearchItem>>>, ApiError> {
    let name = validate_search_query(&query.name)?;
    let items = state.shared.foods.search_foods(name).await;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn all_foods(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<FoodSearchItem>>> {
    Json(ApiResponse::success(state.shared.foods.all_foods().await))
}

pub async fn get_food(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<FoodDto>>, ApiError> {
    let id: i64 = parse_id(&raw_id, "food")?;
    let food = state.shared.foods.get_food(id).await?;
    Ok(Json(ApiResponse::success(food)))
}

/// POST /foods/calc
/// Any lookup failure is a 400.
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CalcRequest>,
) -> Result<Json<ApiResponse<FoodCalculation>>, ApiError> {
    if payload.food_name.trim().is_empty() {
        return Err(ApiError::validation("Food name is required"));
    }

    let result = state
        .shared
        .foods
        .calculate_calories(
            payload.food_name.trim(),
            payload.serving_size.as_deref(),
            payload.portions,
        )
        .await?;

    tracing::debug!(user_id = %user.id, food = %result.food_name, "Calories calculated");
    Ok(Json(ApiResponse::success(result)))
}

/// POST /admin/foods
pub async fn create_food(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FoodDto>,
) -> Result<(StatusCode, Json<ApiResponse<FoodDto>>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Food name is required"));
    }
    let food = state.shared.foods.create_food(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(food))))
}

/// PUT /admin/foods/{id}
pub async fn update_food(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Json(payload): Json<FoodDto>,
) -> Result<Json<ApiResponse<FoodDto>>, ApiError> {
    let id: i64 = parse_id(&raw_id, "food")?;
    let food = state.shared.foods.update_food(id, payload).await?;
    Ok(Json(ApiResponse::success(food)))
}
