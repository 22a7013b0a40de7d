//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::repositories::user::{hash_password_blocking, verify_password};
use crate::db::{NewUserRow, Store};
use crate::domain::{Role, UserId};
use crate::entities::users;
use crate::services::auth_service::{
    AuthError, AuthService, AuthUser, LoginResult, RegisterUser, validate_registration,
};
use crate::services::user_service::UserProfile;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn identity(&self, user: users::Model) -> Result<AuthUser, AuthError> {
        let roles = self.store.user_roles(user.id).await?;
        Ok(AuthUser {
            id: user.id.into(),
            username: user.username,
            roles,
        })
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, request: RegisterUser) -> Result<UserProfile, AuthError> {
        validate_registration(&request, self.security.min_password_length)?;

        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();

        if self.store.username_or_email_taken(&username, &email).await? {
            return Err(AuthError::Conflict(
                "Username or email already taken".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(&request.password, &self.security).await?;

        let roles = if request.roles.is_empty() {
            BTreeSet::from([Role::User])
        } else {
            request.roles
        };

        let row = NewUserRow {
            username,
            email,
            password_hash,
            age: request.age,
            gender: request.gender.map(|g| g.as_str().to_string()),
            height_cm: request.height_cm,
            current_weight_kg: request.current_weight_kg,
            goal: request.goal.map(|g| g.as_str().to_string()),
        };

        let user = self.store.create_user(row, &roles).await?;
        info!(event = "user_registered", user_id = %user.id, username = %user.username);

        Ok(UserProfile::from_model(user, roles))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some(user) = self.store.get_user_by_username(username.trim()).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&user.password_hash, password).await? {
            warn!(event = "login_failed", username = %user.username);
            return Err(AuthError::InvalidCredentials);
        }

        if !user.active {
            return Err(AuthError::Blocked);
        }

        let roles = self.store.user_roles(user.id).await?;
        let api_key = user.api_key.clone();
        info!(event = "login", user_id = %user.id);

        Ok(LoginResult {
            user: UserProfile::from_model(user, roles),
            api_key,
        })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<AuthUser>, AuthError> {
        match self.store.get_user_by_api_key(api_key).await? {
            Some(user) if user.active => Ok(Some(self.identity(user).await?)),
            _ => Ok(None),
        }
    }

    async fn session_user(&self, id: UserId) -> Result<Option<AuthUser>, AuthError> {
        match self.store.get_user(id.value()).await? {
            Some(user) if user.active => Ok(Some(self.identity(user).await?)),
            _ => Ok(None),
        }
    }

    async fn change_password(
        &self,
        id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let min = self.security.min_password_length;
        if new_password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "New password must be at least {min} characters"
            )));
        }

        let user = self
            .store
            .get_user(id.value())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&user.password_hash, current_password).await? {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(new_password, &self.security).await?;
        self.store.set_password_hash(user.id, password_hash).await?;

        info!(event = "password_changed", user_id = %id);
        Ok(())
    }
}
