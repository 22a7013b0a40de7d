//! `SeaORM` implementation of the `ReportService` trait.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheStore, REPORT_CACHE};
use crate::db::Store;
use crate::domain::{DateRange, UserId};
use crate::services::daily_log_service::DailyLogDto;
use crate::services::report_service::{
    ReportError, ReportService, ReportSummary, month_bounds, report_cache_key,
};

pub struct SeaOrmReportService {
    store: Store,
    cache: Arc<dyn CacheStore>,
}

impl SeaOrmReportService {
    #[must_use]
    pub fn new(store: Store, cache: Arc<dyn CacheStore>) -> Self {
        Self { store, cache }
    }

    async fn build_summary(
        &self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReportSummary, ReportError> {
        if self.store.get_user(user.value()).await?.is_none() {
            return Err(ReportError::NotFound(format!("User not found: {user}")));
        }

        let range = DateRange::between(start, end);
        let logs = self.store.list_daily_logs(user.value(), range).await?;

        let total_calories_in = logs.iter().map(|l| i64::from(l.total_calories_in)).sum();
        let total_calories_out = logs.iter().map(|l| i64::from(l.total_calories_out)).sum();

        let entries_count = self.store.count_workouts(user.value(), range).await?;

        let progress = self.store.progress_history(user.value(), range).await?;
        let weight_change = match (progress.first(), progress.last()) {
            (Some(first), Some(last)) => last.weight_kg - first.weight_kg,
            _ => 0.0,
        };

        // Logs arrive ordered by date.
        let daily_logs_with_notes = logs
            .into_iter()
            .filter(|l| l.notes.as_deref().is_some_and(|n| !n.trim().is_empty()))
            .map(DailyLogDto::from)
            .collect();

        Ok(ReportSummary {
            start_date: start,
            end_date: end,
            total_calories_in,
            total_calories_out,
            entries_count,
            weight_change,
            daily_logs_with_notes,
        })
    }
}

#[async_trait]
impl ReportService for SeaOrmReportService {
    async fn generate_summary(
        &self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReportSummary, ReportError> {
        if start > end {
            return Err(ReportError::Validation(
                "Start date must not be after end date".to_string(),
            ));
        }

        let key = report_cache_key(user, start, end);
        if let Some(hit) = self.cache.get_json(REPORT_CACHE, &key).await {
            debug!(%key, "Report served from cache");
            return Ok(hit);
        }

        let summary = self.build_summary(user, start, end).await?;
        info!(
            event = "report_generated",
            user_id = %user,
            %start,
            %end,
            calories_in = summary.total_calories_in,
            calories_out = summary.total_calories_out,
            workouts = summary.entries_count
        );

        self.cache.put_json(REPORT_CACHE, &key, &summary).await;
        Ok(summary)
    }

    async fn weekly(
        &self,
        user: UserId,
        week_start: NaiveDate,
    ) -> Result<ReportSummary, ReportError> {
        let week_end = week_start
            .checked_add_days(Days::new(6))
            .ok_or_else(|| {
                ReportError::Validation(format!("Week start {week_start} is out of range"))
            })?;
        self.generate_summary(user, week_start, week_end).await
    }

    async fn monthly(&self, user: UserId, any_day: NaiveDate) -> Result<ReportSummary, ReportError> {
        let (start, end) = month_bounds(any_day);
        self.generate_summary(user, start, end).await
    }
}
