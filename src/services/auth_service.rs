//! Domain service for authentication.
//!
//! Handles registration, login, password changes, and API key lookup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::domain::{Gender, Goal, Role, UserId};
use crate::services::user_service::UserProfile;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User is blocked")]
    Blocked,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Registration form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub height_cm: Option<i32>,
    #[serde(default)]
    pub current_weight_kg: Option<f64>,
    #[serde(default)]
    pub goal: Option<Goal>,
    /// Defaults to `ROLE_USER` when empty. Never read from request bodies.
    #[serde(skip)]
    pub roles: BTreeSet<Role>,
}

/// Login result containing the profile and API key.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: UserProfile,
    pub api_key: String,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
    pub roles: BTreeSet<Role>,
}

impl AuthUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the username or email is taken and
    /// [`AuthError::Validation`] for malformed input.
    async fn register(&self, request: RegisterUser) -> Result<UserProfile, AuthError>;

    /// Verifies credentials and returns the profile with the API key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails and
    /// [`AuthError::Blocked`] for an inactive account.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves an API key to an active user.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<AuthUser>, AuthError>;

    /// Reloads the identity behind a session. Blocked or deleted users yield `None`.
    async fn session_user(&self, id: UserId) -> Result<Option<AuthUser>, AuthError>;

    /// Changes a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect or the new one is too short.
    async fn change_password(
        &self,
        id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

/// Shape checks applied before an account is created.
pub fn validate_registration(request: &RegisterUser, min_password_length: usize) -> Result<(), AuthError> {
    let username_len = request.username.trim().chars().count();
    if !(3..=30).contains(&username_len) {
        return Err(AuthError::Validation(
            "Username must be between 3 and 30 characters".to_string(),
        ));
    }

    if !request.email.contains('@') {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    if request.password.chars().count() < min_password_length {
        return Err(AuthError::Validation(format!(
            "Password must be at least {min_password_length} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterUser {
        RegisterUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            ..RegisterUser::default()
        }
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration(&request("alice", "a@x.io", "secret"), 6).is_ok());
        assert!(validate_registration(&request("al", "a@x.io", "secret"), 6).is_err());
        assert!(validate_registration(&request("alice", "ax.io", "secret"), 6).is_err());
        assert!(validate_registration(&request("alice", "a@x.io", "short"), 6).is_err());
        assert!(validate_registration(&request(&"x".repeat(31), "a@x.io", "secret"), 6).is_err());
    }
}
