//! Domain service for calorie, workout and weight summaries over a date range.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;
use crate::services::daily_log_service::DailyLogDto;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ReportError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ReportError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_calories_in: i64,
    pub total_calories_out: i64,
    /// Number of workouts in the range.
    pub entries_count: u64,
    pub weight_change: f64,
    pub daily_logs_with_notes: Vec<DailyLogDto>,
}

/// Monday of the week containing `day`.
#[must_use]
pub fn week_start_of(day: NaiveDate) -> NaiveDate {
    let offset = Days::new(u64::from(day.weekday().num_days_from_monday()));
    day.checked_sub_days(offset).unwrap_or(NaiveDate::MIN)
}

/// First and last day of the month containing `day`.
#[must_use]
pub fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = day.with_day(1).unwrap_or(day);
    let last = first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);
    (first, last)
}

/// Cache key of a summary in `reportCache`.
#[must_use]
pub fn report_cache_key(user: UserId, start: NaiveDate, end: NaiveDate) -> String {
    format!("{user}_{start}_{end}")
}

#[async_trait::async_trait]
pub trait ReportService: Send + Sync {
    /// Summary over `[start, end]`, cached per user and range.
    async fn generate_summary(
        &self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReportSummary, ReportError>;

    /// `[week_start, week_start + 6]`.
    async fn weekly(&self, user: UserId, week_start: NaiveDate)
    -> Result<ReportSummary, ReportError>;

    /// The whole calendar month containing `any_day`.
    async fn monthly(&self, user: UserId, any_day: NaiveDate) -> Result<ReportSummary, ReportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2024-05-16 is a Thursday.
        assert_eq!(week_start_of(date(2024, 5, 16)), date(2024, 5, 13));
        assert_eq!(week_start_of(date(2024, 5, 13)), date(2024, 5, 13));
        assert_eq!(week_start_of(date(2024, 5, 19)), date(2024, 5, 13));
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(date(2024, 2, 10)), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(month_bounds(date(2023, 12, 31)), (date(2023, 12, 1), date(2023, 12, 31)));
    }
}
