//! `SeaORM` implementation of the `AdminService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::db::Store;
use crate::domain::{Role, UserId};
use crate::services::admin_service::{AdminError, AdminService, UserWeightReport};
use crate::services::user_service::{Page, UserProfile, UserService};

pub struct SeaOrmAdminService {
    store: Store,
    users: Arc<dyn UserService>,
}

impl SeaOrmAdminService {
    #[must_use]
    pub fn new(store: Store, users: Arc<dyn UserService>) -> Self {
        Self { store, users }
    }
}

#[async_trait]
impl AdminService for SeaOrmAdminService {
    async fn assign_role(&self, id: UserId, role: Role) -> Result<UserProfile, AdminError> {
        self.users.require_user(id).await?;

        if self.store.add_role(id.value(), role).await? {
            info!(event = "role_assigned", user_id = %id, %role);
        }
        Ok(self.users.get_profile(id).await?)
    }

    async fn revoke_role(&self, id: UserId, role: Role) -> Result<UserProfile, AdminError> {
        self.users.require_user(id).await?;

        let roles = self.store.user_roles(id.value()).await?;
        if roles.len() == 1 && roles.contains(&role) {
            return Err(AdminError::Validation(
                "Cannot remove the user's last role".to_string(),
            ));
        }

        if self.store.remove_role(id.value(), role).await? {
            info!(event = "role_revoked", user_id = %id, %role);
        }
        Ok(self.users.get_profile(id).await?)
    }

    async fn block(&self, id: UserId) -> Result<UserProfile, AdminError> {
        Ok(self.users.block(id).await?)
    }

    async fn unblock(&self, id: UserId) -> Result<UserProfile, AdminError> {
        Ok(self.users.unblock(id).await?)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), AdminError> {
        if !self.store.delete_user(id.value()).await? {
            return Err(AdminError::NotFound(id));
        }
        info!(event = "user_deleted", user_id = %id);
        Ok(())
    }

    async fn list_users(
        &self,
        keyword: Option<&str>,
        page: u64,
        size: u64,
    ) -> Result<Page<UserProfile>, AdminError> {
        let page = match keyword.map(str::trim).filter(|k| !k.is_empty()) {
            Some(keyword) => self.users.search_users(keyword, page, size).await?,
            None => self.users.list_users(page, size).await?,
        };
        Ok(page)
    }

    async fn users_with_last_weight(&self) -> Result<Vec<UserWeightReport>, AdminError> {
        let users = self.store.list_all_users().await?;
        let ids: Vec<_> = users.iter().map(|u| u.id).collect();
        let mut roles = self.store.roles_for_users(&ids).await?;
        let mut latest = self.store.latest_progress_for_all().await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let entry = latest.remove(&user.id);
                let user_roles = roles.remove(&user.id).unwrap_or_default();
                UserWeightReport {
                    user: UserProfile::from_model(user, user_roles),
                    last_weight_kg: entry.as_ref().map(|e| e.weight_kg),
                    last_weight_date: entry.map(|e| e.date),
                }
            })
            .collect())
    }
}
