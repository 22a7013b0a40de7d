use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{parse_id, validate_page, validate_page_size};
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::{Role, UserId};
use crate::services::{AuthUser, Page, UserProfile, UserWeightReport};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
    #[serde(default)]
    pub q: Option<String>,
    /// Restricts the listing to holders of this role; paging is ignored.
    #[serde(default)]
    pub role: Option<String>,
}

const fn default_page_size() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: String,
    #[serde(default = "default_role_action")]
    pub action: String,
}

fn default_role_action() -> String {
    "assign".to_string()
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Page<UserProfile>>>, ApiError> {
    if let Some(raw) = query.role.as_deref().filter(|r| !r.trim().is_empty()) {
        let role = Role::parse_lenient(raw).map_err(|e| ApiError::validation(e.to_string()))?;
        let users = state.shared.users.find_by_role(role).await?;
        let total = users.len() as u64;
        return Ok(Json(ApiResponse::success(Page::new(
            users,
            0,
            total.max(1),
            total,
        ))));
    }

    let size = validate_page_size(query.size)?;
    let page = validate_page(query.page, size)?;
    let page = state
        .shared
        .admin
        .list_users(query.q.as_deref(), page, size)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn block_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let id: UserId = parse_id(&raw_id, "user")?;
    if id == admin.id {
        return Err(ApiError::validation("Administrators cannot block themselves"));
    }
    let profile = state.shared.admin.block(id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

pub async fn unblock_user(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let id: UserId = parse_id(&raw_id, "user")?;
    let profile = state.shared.admin.unblock(id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// POST /admin/users/{id}/roles?role=ADMIN&action=assign|remove
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    Query(query): Query<RoleQuery>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let id: UserId = parse_id(&raw_id, "user")?;
    let role = Role::parse_lenient(&query.role).map_err(|e| ApiError::validation(e.to_string()))?;

    let profile = match query.action.trim().to_ascii_lowercase().as_str() {
        "assign" => state.shared.admin.assign_role(id, role).await?,
        "remove" => state.shared.admin.revoke_role(id, role).await?,
        other => {
            return Err(ApiError::validation(format!(
                "Unknown role action: {other}. Use assign or remove"
            )));
        }
    };

    Ok(Json(ApiResponse::success(profile)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id: UserId = parse_id(&raw_id, "user")?;
    if id == admin.id {
        return Err(ApiError::validation("Administrators cannot delete themselves"));
    }
    state.shared.admin.delete_user(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("User deleted"))))
}

/// GET /admin/reports/users
pub async fn users_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserWeightReport>>>, ApiError> {
    let rows = state.shared.admin.users_with_last_weight().await?;
    Ok(Json(ApiResponse::success(rows)))
}
