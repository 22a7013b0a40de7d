//! Domain service for workouts and their calorie-burn estimates.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DateRange, Patch, UserId, WorkoutId, WorkoutType};
use crate::entities::workouts;
use crate::services::daily_log_service::DailyLogDto;

#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error("Workout not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for WorkoutError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for WorkoutError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutDto {
    pub id: WorkoutId,
    pub user_id: UserId,
    pub date_time: NaiveDateTime,
    pub workout_type: WorkoutType,
    pub duration_minutes: Option<i32>,
    pub calories_burned: Option<i32>,
    pub notes: Option<String>,
}

impl From<workouts::Model> for WorkoutDto {
    fn from(model: workouts::Model) -> Self {
        Self {
            id: model.id.into(),
            user_id: model.user_id.into(),
            date_time: model.date_time,
            workout_type: model.workout_type.parse().unwrap_or(WorkoutType::Other),
            duration_minutes: model.duration_minutes,
            calories_burned: model.calories_burned,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutWrite {
    pub workout: WorkoutDto,
    pub daily_log: DailyLogDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkout {
    pub date_time: NaiveDateTime,
    pub workout_type: WorkoutType,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub calories_burned: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Missing and `null` fields are both left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkoutUpdate {
    pub date_time: Patch<NaiveDateTime>,
    pub workout_type: Patch<WorkoutType>,
    pub duration_minutes: Patch<i32>,
    pub calories_burned: Patch<i32>,
    pub notes: Patch<String>,
}

pub const DEFAULT_WEIGHT_KG: f64 = 70.0;
pub const DEFAULT_DURATION_MINUTES: i32 = 30;

/// `round(MET * weight_kg * minutes / 60)`, falling back to 70 kg and 30 minutes.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn estimate_calories_burned(
    workout_type: WorkoutType,
    weight_kg: Option<f64>,
    duration_minutes: Option<i32>,
) -> i32 {
    let weight = weight_kg.unwrap_or(DEFAULT_WEIGHT_KG);
    let minutes = f64::from(duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES));
    (workout_type.met() * weight * minutes / 60.0).round() as i32
}

#[async_trait::async_trait]
pub trait WorkoutService: Send + Sync {
    /// Stores the workout and refreshes that day's log. Calories are estimated
    /// when `auto_estimate` is set or none were supplied.
    async fn add_workout(
        &self,
        user: UserId,
        workout: NewWorkout,
        auto_estimate: bool,
    ) -> Result<WorkoutWrite, WorkoutError>;

    /// Supplied calories win; otherwise `auto_estimate` re-estimates from the
    /// updated fields.
    async fn update_workout(
        &self,
        user: UserId,
        id: WorkoutId,
        update: WorkoutUpdate,
        auto_estimate: bool,
    ) -> Result<WorkoutWrite, WorkoutError>;

    async fn delete_workout(&self, user: UserId, id: WorkoutId) -> Result<(), WorkoutError>;

    /// Workouts from `start 00:00` up to but excluding `end + 1 00:00`, oldest first.
    async fn find_workouts(
        &self,
        user: UserId,
        range: DateRange,
    ) -> Result<Vec<WorkoutDto>, WorkoutError>;

    /// Newest first.
    async fn recent_workouts(
        &self,
        user: UserId,
        since: NaiveDate,
        limit: u64,
    ) -> Result<Vec<WorkoutDto>, WorkoutError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_uses_met_table() {
        assert_eq!(estimate_calories_burned(WorkoutType::Cardio, Some(80.0), Some(45)), 480);
        assert_eq!(estimate_calories_burned(WorkoutType::Strength, Some(65.0), Some(60)), 390);
        assert_eq!(estimate_calories_burned(WorkoutType::Yoga, Some(65.0), Some(30)), 98);
    }

    #[test]
    fn test_estimate_defaults() {
        // 4.0 * 70 * 30 / 60
        assert_eq!(estimate_calories_burned(WorkoutType::Other, None, None), 140);
    }
}
