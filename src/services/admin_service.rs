//! Domain service for administrator-only account management.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Role, UserId};
use crate::services::user_service::{Page, UserError, UserProfile};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AdminError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<UserError> for AdminError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => Self::NotFound(id),
            UserError::Validation(msg) | UserError::Conflict(msg) => Self::Validation(msg),
            UserError::Database(msg) => Self::Database(msg),
            UserError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// Row of the administrator's user report.
#[derive(Debug, Clone, Serialize)]
pub struct UserWeightReport {
    pub user: UserProfile,
    pub last_weight_kg: Option<f64>,
    pub last_weight_date: Option<chrono::NaiveDate>,
}

#[async_trait::async_trait]
pub trait AdminService: Send + Sync {
    async fn assign_role(&self, id: UserId, role: Role) -> Result<UserProfile, AdminError>;

    /// # Errors
    ///
    /// Returns [`AdminError::Validation`] when the role is the user's last one.
    async fn revoke_role(&self, id: UserId, role: Role) -> Result<UserProfile, AdminError>;

    async fn block(&self, id: UserId) -> Result<UserProfile, AdminError>;

    async fn unblock(&self, id: UserId) -> Result<UserProfile, AdminError>;

    /// Deletes the account together with its logs, meals, workouts and progress.
    async fn delete_user(&self, id: UserId) -> Result<(), AdminError>;

    async fn list_users(
        &self,
        keyword: Option<&str>,
        page: u64,
        size: u64,
    ) -> Result<Page<UserProfile>, AdminError>;

    async fn users_with_last_weight(&self) -> Result<Vec<UserWeightReport>, AdminError>;
}
