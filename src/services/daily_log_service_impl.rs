//! `SeaORM` implementation of the `DailyLogService` trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::db::Store;
use crate::domain::{DailyLogId, DateRange, UserId};
use crate::entities::daily_logs;
use crate::services::daily_log_service::{
    DailyLogDto, DailyLogError, DailyLogService, MAX_NOTES_LENGTH, normalize_notes,
};

pub struct SeaOrmDailyLogService {
    store: Store,
}

impl SeaOrmDailyLogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn owned_log(
        &self,
        user: UserId,
        id: DailyLogId,
    ) -> Result<daily_logs::Model, DailyLogError> {
        self.store
            .get_daily_log(id.value())
            .await?
            .filter(|log| log.user_id == user.value())
            .ok_or_else(|| DailyLogError::NotFound(id.to_string()))
    }
}

fn checked_notes(notes: Option<&str>) -> Result<Option<String>, DailyLogError> {
    let notes = normalize_notes(notes);
    if notes
        .as_ref()
        .is_some_and(|n| n.chars().count() > MAX_NOTES_LENGTH)
    {
        return Err(DailyLogError::Validation(format!(
            "Notes must be at most {MAX_NOTES_LENGTH} characters"
        )));
    }
    Ok(notes)
}

#[async_trait]
impl DailyLogService for SeaOrmDailyLogService {
    async fn create_or_update(
        &self,
        user: UserId,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<DailyLogDto, DailyLogError> {
        let notes = checked_notes(notes)?;
        let (log, created) = self
            .store
            .create_or_update_daily_log(user.value(), date, notes)
            .await?;

        if created {
            info!(event = "daily_log_created", user_id = %user, %date);
        }
        Ok(log.into())
    }

    async fn get(&self, user: UserId, id: DailyLogId) -> Result<DailyLogDto, DailyLogError> {
        Ok(self.owned_log(user, id).await?.into())
    }

    async fn get_by_date(
        &self,
        user: UserId,
        date: NaiveDate,
    ) -> Result<Option<DailyLogDto>, DailyLogError> {
        Ok(self
            .store
            .get_daily_log_by_date(user.value(), date)
            .await?
            .map(Into::into))
    }

    async fn update_notes(
        &self,
        user: UserId,
        id: DailyLogId,
        notes: Option<&str>,
    ) -> Result<DailyLogDto, DailyLogError> {
        let notes = checked_notes(notes)?;
        self.owned_log(user, id).await?;

        self.store
            .update_daily_log_notes(id.value(), notes)
            .await?
            .map(Into::into)
            .ok_or_else(|| DailyLogError::NotFound(id.to_string()))
    }

    async fn delete(&self, user: UserId, id: DailyLogId) -> Result<(), DailyLogError> {
        self.owned_log(user, id).await?;
        self.store.delete_daily_log(id.value()).await?;
        info!(event = "daily_log_deleted", user_id = %user, log_id = %id);
        Ok(())
    }

    async fn compute_daily_totals(
        &self,
        user: UserId,
        date: NaiveDate,
    ) -> Result<DailyLogDto, DailyLogError> {
        self.store
            .recompute_daily_totals(user.value(), date)
            .await?
            .map(Into::into)
            .ok_or_else(|| DailyLogError::NotFound(format!("no log for {date}")))
    }

    async fn get_logs_between(
        &self,
        user: UserId,
        range: DateRange,
    ) -> Result<Vec<DailyLogDto>, DailyLogError> {
        let logs = self.store.list_daily_logs(user.value(), range).await?;
        Ok(logs.into_iter().map(Into::into).collect())
    }

    async fn delete_older_than(&self, cutoff: NaiveDate) -> Result<u64, DailyLogError> {
        let removed = self.store.delete_daily_logs_before(cutoff).await?;
        info!(event = "daily_logs_pruned", %cutoff, removed);
        Ok(removed)
    }
}
