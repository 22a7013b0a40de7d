//! `SeaORM` implementation of the `ProgressService` trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::db::Store;
use crate::domain::{DateRange, UserId};
use crate::services::progress_service::{ProgressDto, ProgressError, ProgressService};

pub struct SeaOrmProgressService {
    store: Store,
}

impl SeaOrmProgressService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProgressService for SeaOrmProgressService {
    async fn add_progress(
        &self,
        user: UserId,
        date: NaiveDate,
        weight_kg: f64,
        notes: Option<String>,
    ) -> Result<ProgressDto, ProgressError> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(ProgressError::Validation(
                "Weight must be a positive number".to_string(),
            ));
        }

        if self.store.get_user(user.value()).await?.is_none() {
            return Err(ProgressError::NotFound(format!("User not found: {user}")));
        }

        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let entry = self
            .store
            .insert_progress(user.value(), date, weight_kg, notes)
            .await?;

        info!(event = "progress_added", user_id = %user, %date, weight_kg);
        Ok(entry.into())
    }

    async fn get_progress_history(
        &self,
        user: UserId,
        range: DateRange,
    ) -> Result<Vec<ProgressDto>, ProgressError> {
        let rows = self.store.progress_history(user.value(), range).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn latest_for_user(&self, user: UserId) -> Result<Option<ProgressDto>, ProgressError> {
        Ok(self
            .store
            .latest_progress(user.value())
            .await?
            .map(Into::into))
    }
}
