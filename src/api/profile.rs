use axum::{Extension, Json, extract::State};
use chrono::{Duration, Local};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, DashboardDto};
use crate::services::{AuthUser, DailyLogError, ProfileUpdate, UserProfile};

const DASHBOARD_WORKOUTS: u64 = 5;

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let profile = state.shared.users.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let profile = state.shared.users.update_profile(user.id, payload).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// GET /dashboard
/// Today's log with fresh totals, the latest workouts of the past week and
/// the newest weigh-in.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<DashboardDto>>, ApiError> {
    let today = Local::now().date_naive();

    let today_log = match state.shared.daily_logs.compute_daily_totals(user.id, today).await {
        Ok(log) => Some(log),
        Err(DailyLogError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    let recent_workouts = state
        .shared
        .workouts
        .recent_workouts(user.id, today - Duration::days(7), DASHBOARD_WORKOUTS)
        .await?;

    let latest_progress = state.shared.progress.latest_for_user(user.id).await?;

    Ok(Json(ApiResponse::success(DashboardDto {
        date: today,
        today: today_log,
        recent_workouts,
        latest_progress,
    })))
}
