//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::domain::{Goal, Role, UserId};
use crate::entities::users;
use crate::services::user_service::{Page, ProfileUpdate, UserError, UserProfile, UserService};

pub struct SeaOrmUserService {
    store: Store,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn profile_of(&self, model: users::Model) -> Result<UserProfile, UserError> {
        let roles = self.store.user_roles(model.id).await?;
        Ok(UserProfile::from_model(model, roles))
    }

    async fn page_of(
        &self,
        rows: Vec<users::Model>,
        page: u64,
        size: u64,
        total: u64,
    ) -> Result<Page<UserProfile>, UserError> {
        let ids: Vec<_> = rows.iter().map(|u| u.id).collect();
        let mut roles = self.store.roles_for_users(&ids).await?;

        let content = rows
            .into_iter()
            .map(|u| {
                let user_roles = roles.remove(&u.id).unwrap_or_default();
                UserProfile::from_model(u, user_roles)
            })
            .collect();

        Ok(Page::new(content, page, size, total))
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<UserProfile, UserError> {
        let user = self
            .store
            .set_user_active(id.value(), active)
            .await?
            .ok_or(UserError::NotFound(id))?;

        info!(event = "user_active_changed", user_id = %id, active);
        self.profile_of(user).await
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn require_user(&self, id: UserId) -> Result<users::Model, UserError> {
        self.store
            .get_user(id.value())
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn get_profile(&self, id: UserId) -> Result<UserProfile, UserError> {
        let user = self.require_user(id).await?;
        self.profile_of(user).await
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, UserError> {
        let mut user = self.require_user(id).await?;

        let email = update
            .email
            .into_value()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty() && *e != user.email);
        if let Some(email) = email {
            if !email.contains('@') {
                return Err(UserError::Validation("Invalid email address".to_string()));
            }
            if self.store.email_taken_by_other(&email, user.id).await? {
                return Err(UserError::Conflict("Email already taken".to_string()));
            }
            user.email = email;
        }

        update.age.apply_to_option(&mut user.age);
        update.height_cm.apply_to_option(&mut user.height_cm);
        update
            .current_weight_kg
            .apply_to_option(&mut user.current_weight_kg);
        update
            .gender
            .map(|g| g.as_str().to_string())
            .apply_to_option(&mut user.gender);
        update
            .goal
            .map(|g| g.as_str().to_string())
            .apply_to_option(&mut user.goal);

        let saved = self.store.save_user(user).await?;
        info!(event = "profile_updated", user_id = %id);
        self.profile_of(saved).await
    }

    async fn update_profile_fields(
        &self,
        id: UserId,
        age: Option<i32>,
        weight: Option<&str>,
        goal: Option<&str>,
    ) -> Result<UserProfile, UserError> {
        let mut user = self.require_user(id).await?;

        user.current_weight_kg = match weight.map(str::trim).filter(|w| !w.is_empty()) {
            Some(w) => Some(
                w.parse::<f64>()
                    .map_err(|_| UserError::Validation("Invalid weight format".to_string()))?,
            ),
            None => None,
        };

        user.goal = match goal.map(str::trim).filter(|g| !g.is_empty()) {
            Some(g) => Some(
                g.parse::<Goal>()
                    .map_err(|_| UserError::Validation("Invalid goal value".to_string()))?
                    .as_str()
                    .to_string(),
            ),
            None => None,
        };

        user.age = age;

        let saved = self.store.save_user(user).await?;
        self.profile_of(saved).await
    }

    async fn block(&self, id: UserId) -> Result<UserProfile, UserError> {
        self.set_active(id, false).await
    }

    async fn unblock(&self, id: UserId) -> Result<UserProfile, UserError> {
        self.set_active(id, true).await
    }

    async fn list_users(&self, page: u64, size: u64) -> Result<Page<UserProfile>, UserError> {
        let (rows, total) = self.store.list_users_page(None, page, size).await?;
        self.page_of(rows, page, size, total).await
    }

    async fn search_users(
        &self,
        keyword: &str,
        page: u64,
        size: u64,
    ) -> Result<Page<UserProfile>, UserError> {
        let (rows, total) = self
            .store
            .list_users_page(Some(keyword), page, size)
            .await?;
        self.page_of(rows, page, size, total).await
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<UserProfile>, UserError> {
        let rows = self.store.users_with_role(role).await?;
        let total = rows.len() as u64;
        let size = total.max(1);
        Ok(self.page_of(rows, 0, size, total).await?.content)
    }
}
