//! Domain service for per-date daily logs and their calorie totals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DailyLogId, DateRange, UserId};
use crate::entities::daily_logs;

#[derive(Debug, Error)]
pub enum DailyLogError {
    #[error("Daily log not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for DailyLogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DailyLogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLogDto {
    pub id: DailyLogId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub total_calories_in: i32,
    pub total_calories_out: i32,
    pub net_calories: i32,
    pub notes: Option<String>,
}

impl From<daily_logs::Model> for DailyLogDto {
    fn from(model: daily_logs::Model) -> Self {
        Self {
            id: model.id.into(),
            user_id: model.user_id.into(),
            date: model.date,
            total_calories_in: model.total_calories_in,
            total_calories_out: model.total_calories_out,
            net_calories: model.total_calories_in - model.total_calories_out,
            notes: model.notes,
        }
    }
}

/// Trims notes and maps blank input to `None`.
#[must_use]
pub fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ToString::to_string)
}

pub const MAX_NOTES_LENGTH: usize = 1000;

#[async_trait::async_trait]
pub trait DailyLogService: Send + Sync {
    /// Returns the log for `date`, creating it if needed. Non-blank notes
    /// replace the stored ones; blank notes leave an existing log untouched.
    async fn create_or_update(
        &self,
        user: UserId,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<DailyLogDto, DailyLogError>;

    /// Loads a log owned by `user`. Other users' logs are reported as missing.
    async fn get(&self, user: UserId, id: DailyLogId) -> Result<DailyLogDto, DailyLogError>;

    async fn get_by_date(
        &self,
        user: UserId,
        date: NaiveDate,
    ) -> Result<Option<DailyLogDto>, DailyLogError>;

    /// Blank notes clear the field.
    async fn update_notes(
        &self,
        user: UserId,
        id: DailyLogId,
        notes: Option<&str>,
    ) -> Result<DailyLogDto, DailyLogError>;

    async fn delete(&self, user: UserId, id: DailyLogId) -> Result<(), DailyLogError>;

    /// Recalculates and persists the totals of the user's log for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`DailyLogError::NotFound`] when there is no log on that date.
    async fn compute_daily_totals(
        &self,
        user: UserId,
        date: NaiveDate,
    ) -> Result<DailyLogDto, DailyLogError>;

    /// Inclusive range ordered by date.
    async fn get_logs_between(
        &self,
        user: UserId,
        range: DateRange,
    ) -> Result<Vec<DailyLogDto>, DailyLogError>;

    /// Removes logs dated before `cutoff` and returns how many were deleted.
    async fn delete_older_than(&self, cutoff: NaiveDate) -> Result<u64, DailyLogError>;
}
