//! Domain service for body-weight progress entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DateRange, ProgressId, UserId};
use crate::entities::progress_entries;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ProgressError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProgressError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressDto {
    pub id: ProgressId,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub notes: Option<String>,
}

impl From<progress_entries::Model> for ProgressDto {
    fn from(model: progress_entries::Model) -> Self {
        Self {
            id: model.id.into(),
            date: model.date,
            weight_kg: model.weight_kg,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressTrend {
    pub start_weight: f64,
    pub end_weight: f64,
    pub delta: f64,
    pub points: usize,
}

/// First-to-last weight change over a date-ordered history.
#[must_use]
pub fn compute_trend(history: &[ProgressDto]) -> ProgressTrend {
    match (history.first(), history.last()) {
        (Some(first), Some(last)) => ProgressTrend {
            start_weight: first.weight_kg,
            end_weight: last.weight_kg,
            delta: last.weight_kg - first.weight_kg,
            points: history.len(),
        },
        _ => ProgressTrend::default(),
    }
}

#[async_trait::async_trait]
pub trait ProgressService: Send + Sync {
    /// Inserts unconditionally; several entries may share a date.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Validation`] for a non-positive weight.
    async fn add_progress(
        &self,
        user: UserId,
        date: NaiveDate,
        weight_kg: f64,
        notes: Option<String>,
    ) -> Result<ProgressDto, ProgressError>;

    /// Ascending by date.
    async fn get_progress_history(
        &self,
        user: UserId,
        range: DateRange,
    ) -> Result<Vec<ProgressDto>, ProgressError>;

    async fn latest_for_user(&self, user: UserId) -> Result<Option<ProgressDto>, ProgressError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: u32, weight_kg: f64) -> ProgressDto {
        ProgressDto {
            id: ProgressId::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            weight_kg,
            notes: None,
        }
    }

    #[test]
    fn test_trend_over_history() {
        let trend = compute_trend(&[entry(1, 80.0), entry(2, 79.5), entry(3, 78.75)]);
        assert!((trend.start_weight - 80.0).abs() < f64::EPSILON);
        assert!((trend.end_weight - 78.75).abs() < f64::EPSILON);
        assert!((trend.delta + 1.25).abs() < f64::EPSILON);
        assert_eq!(trend.points, 3);
    }

    #[test]
    fn test_trend_of_empty_history_is_zero() {
        assert_eq!(compute_trend(&[]), ProgressTrend::default());
    }
}
