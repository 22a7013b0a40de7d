//! Domain service for account profiles and user administration queries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::domain::{Gender, Goal, Patch, Role, UserId};
use crate::entities::users;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Account as shown to its owner and to administrators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub height_cm: Option<i32>,
    pub current_weight_kg: Option<f64>,
    pub goal: Option<Goal>,
    pub active: bool,
    pub created_at: String,
}

impl UserProfile {
    #[must_use]
    pub fn from_model(model: users::Model, roles: BTreeSet<Role>) -> Self {
        Self {
            id: model.id.into(),
            gender: model.gender.as_deref().and_then(|g| g.parse().ok()),
            goal: model.goal.as_deref().and_then(|g| g.parse().ok()),
            username: model.username,
            email: model.email,
            roles,
            age: model.age,
            height_cm: model.height_cm,
            current_weight_kg: model.current_weight_kg,
            active: model.active,
            created_at: model.created_at,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// JSON profile patch. Missing and `null` fields are both left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub email: Patch<String>,
    pub age: Patch<i32>,
    pub gender: Patch<Gender>,
    pub height_cm: Patch<i32>,
    pub current_weight_kg: Patch<f64>,
    pub goal: Patch<Goal>,
}

/// Zero-based page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(content: Vec<T>, page: u64, size: u64, total_elements: u64) -> Self {
        let size = size.max(1);
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Loads a user or fails with [`UserError::NotFound`].
    async fn require_user(&self, id: UserId) -> Result<users::Model, UserError>;

    async fn get_profile(&self, id: UserId) -> Result<UserProfile, UserError>;

    /// Applies the supplied fields. A blank email is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] if the new email belongs to another account.
    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, UserError>;

    /// Form-based profile edit: blank weight or goal clears the field.
    async fn update_profile_fields(
        &self,
        id: UserId,
        age: Option<i32>,
        weight: Option<&str>,
        goal: Option<&str>,
    ) -> Result<UserProfile, UserError>;

    async fn block(&self, id: UserId) -> Result<UserProfile, UserError>;

    async fn unblock(&self, id: UserId) -> Result<UserProfile, UserError>;

    async fn list_users(&self, page: u64, size: u64) -> Result<Page<UserProfile>, UserError>;

    /// Case-insensitive substring match on username or email; blank lists everyone.
    async fn search_users(
        &self,
        keyword: &str,
        page: u64,
        size: u64,
    ) -> Result<Page<UserProfile>, UserError>;

    async fn find_by_role(&self, role: Role) -> Result<Vec<UserProfile>, UserError>;
}
