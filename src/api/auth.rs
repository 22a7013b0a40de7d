use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::observability::RequestUser;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::UserId;
use crate::services::{AuthUser, LoginResult, RegisterUser, UserProfile};

/// Session key holding the logged-in user's id.
pub const SESSION_USER_KEY: &str = "user";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller from, in order:
/// 1. the session cookie set by login
/// 2. the `X-Api-Key` header
/// 3. an `Authorization: Bearer <api_key>` header
///
/// The resolved [`AuthUser`] is stored in the request extensions, and its id
/// on the response for the request span.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(user) = resolve_user(&state, &headers, &session).await else {
        return ApiError::Unauthorized("Authentication required".to_string()).into_response();
    };

    let user_id = user.id;
    request.extensions_mut().insert(user);
    let mut response = next.run(request).await;
    response.extensions_mut().insert(RequestUser(user_id));
    response
}

/// Rejects callers without `ROLE_ADMIN`. Must run inside [`auth_middleware`].
pub async fn admin_middleware(request: Request, next: Next) -> Response {
    let is_admin = request
        .extensions()
        .get::<AuthUser>()
        .is_some_and(AuthUser::is_admin);

    if !is_admin {
        return ApiError::forbidden("Administrator role required").into_response();
    }

    next.run(request).await
}

pub async fn resolve_user(
    state: &AppState,
    headers: &HeaderMap,
    session: &Session,
) -> Option<AuthUser> {
    if let Some(user) = session_user(state, session).await {
        return Some(user);
    }

    let key = extract_api_key(headers)?;
    match state.shared.auth.verify_api_key(&key).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "API key lookup failed");
            None
        }
    }
}

pub async fn session_user(state: &AppState, session: &Session) -> Option<AuthUser> {
    let id = session.get::<UserId>(SESSION_USER_KEY).await.ok().flatten()?;
    state.shared.auth.session_user(id).await.ok().flatten()
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), ApiError> {
    let profile = state.shared.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(profile))))
}

/// POST /auth/login
/// Starts a session and returns the profile with the API key.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .shared
        .auth
        .login(payload.username.trim(), &payload.password)
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, result.user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush session");
    }
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let profile = state.shared.users.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    state
        .shared
        .auth
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;

    tracing::info!(event = "password_changed", user_id = %user.id);

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}
