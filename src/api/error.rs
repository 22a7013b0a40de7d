use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{
    AdminError, AuthError, DailyLogError, FoodError, MealError, ProgressError, ReportError,
    UserError, WorkoutError,
};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ExternalApiError { service: String, message: String },

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ExternalApiError { service, message } => {
                write!(f, "{service} error: {message}")
            }
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::ExternalApiError { service, message } => {
                tracing::warn!("{} API error: {}", service, message);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("{service} service is unavailable"),
                )
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::NotFound(err.to_string()),
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::Validation(msg) => Self::ValidationError(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::Blocked => {
                Self::Unauthorized(err.to_string())
            }
            AuthError::UserNotFound => Self::NotFound(err.to_string()),
            AuthError::Conflict(msg) => Self::Conflict(msg),
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::NotFound(_) => Self::NotFound(err.to_string()),
            AdminError::Validation(msg) => Self::ValidationError(msg),
            AdminError::Database(msg) => Self::DatabaseError(msg),
            AdminError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<DailyLogError> for ApiError {
    fn from(err: DailyLogError) -> Self {
        match err {
            DailyLogError::NotFound(_) => Self::NotFound(err.to_string()),
            DailyLogError::Validation(msg) => Self::ValidationError(msg),
            DailyLogError::Database(msg) => Self::DatabaseError(msg),
            DailyLogError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<MealError> for ApiError {
    fn from(err: MealError) -> Self {
        match err {
            MealError::NotFound(_) => Self::NotFound(err.to_string()),
            MealError::Validation(msg) => Self::ValidationError(msg),
            MealError::Database(msg) => Self::DatabaseError(msg),
            MealError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<WorkoutError> for ApiError {
    fn from(err: WorkoutError) -> Self {
        match err {
            WorkoutError::NotFound(_) => Self::NotFound(err.to_string()),
            WorkoutError::Validation(msg) => Self::ValidationError(msg),
            WorkoutError::Database(msg) => Self::DatabaseError(msg),
            WorkoutError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<ProgressError> for ApiError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::NotFound(msg) => Self::NotFound(msg),
            ProgressError::Validation(msg) => Self::ValidationError(msg),
            ProgressError::Database(msg) => Self::DatabaseError(msg),
            ProgressError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NotFound(msg) => Self::NotFound(msg),
            ReportError::Validation(msg) => Self::ValidationError(msg),
            ReportError::Database(msg) => Self::DatabaseError(msg),
            ReportError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<FoodError> for ApiError {
    fn from(err: FoodError) -> Self {
        match err {
            FoodError::LookupFailed(msg) => Self::ValidationError(msg),
            FoodError::Upstream(message) => Self::ExternalApiError {
                service: "Nutrition".to_string(),
                message,
            },
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_errors_map_to_status() {
        let cases = [
            (ApiError::from(MealError::NotFound("x".into())), StatusCode::NOT_FOUND),
            (ApiError::from(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (ApiError::from(UserError::Conflict("taken".into())), StatusCode::CONFLICT),
            (ApiError::from(FoodError::LookupFailed("nope".into())), StatusCode::BAD_REQUEST),
            (ApiError::from(FoodError::Upstream("down".into())), StatusCode::BAD_GATEWAY),
            (ApiError::forbidden("admins only"), StatusCode::FORBIDDEN),
            (ApiError::from(WorkoutError::Database("locked".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
