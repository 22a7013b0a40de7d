//! `SeaORM` implementation of the `WorkoutService` trait.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tracing::info;

use crate::db::{NewWorkoutRow, Store};
use crate::domain::{DateRange, UserId, WorkoutId, WorkoutType};
use crate::entities::workouts;
use crate::services::workout_service::{
    NewWorkout, WorkoutDto, WorkoutError, WorkoutService, WorkoutUpdate, WorkoutWrite,
    estimate_calories_burned,
};

pub struct SeaOrmWorkoutService {
    store: Store,
}

impl SeaOrmWorkoutService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn current_weight(&self, user: UserId) -> Result<Option<f64>, WorkoutError> {
        let user = self
            .store
            .get_user(user.value())
            .await?
            .ok_or_else(|| WorkoutError::NotFound(format!("user {user}")))?;
        Ok(user.current_weight_kg)
    }

    async fn owned_workout(
        &self,
        user: UserId,
        id: WorkoutId,
    ) -> Result<workouts::Model, WorkoutError> {
        self.store
            .get_workout(id.value())
            .await?
            .filter(|w| w.user_id == user.value())
            .ok_or_else(|| WorkoutError::NotFound(id.to_string()))
    }
}

fn check_duration(duration: Option<i32>) -> Result<(), WorkoutError> {
    if duration.is_some_and(|d| d < 0) {
        return Err(WorkoutError::Validation(
            "Duration must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl WorkoutService for SeaOrmWorkoutService {
    async fn add_workout(
        &self,
        user: UserId,
        workout: NewWorkout,
        auto_estimate: bool,
    ) -> Result<WorkoutWrite, WorkoutError> {
        check_duration(workout.duration_minutes)?;
        let weight = self.current_weight(user).await?;

        let calories_burned = if auto_estimate || workout.calories_burned.is_none() {
            Some(estimate_calories_burned(
                workout.workout_type,
                weight,
                workout.duration_minutes,
            ))
        } else {
            workout.calories_burned
        };

        let row = NewWorkoutRow {
            user_id: user.value(),
            date_time: workout.date_time,
            workout_type: workout.workout_type.as_str().to_string(),
            duration_minutes: workout.duration_minutes,
            calories_burned,
            notes: workout.notes,
        };

        let (workout, log) = self.store.insert_workout(row).await?;
        info!(
            event = "workout_added",
            workout_id = %workout.id,
            calories_burned = ?workout.calories_burned
        );

        Ok(WorkoutWrite {
            workout: workout.into(),
            daily_log: log.into(),
        })
    }

    async fn update_workout(
        &self,
        user: UserId,
        id: WorkoutId,
        update: WorkoutUpdate,
        auto_estimate: bool,
    ) -> Result<WorkoutWrite, WorkoutError> {
        let mut workout = self.owned_workout(user, id).await?;
        let previous_date = workout.date_time.date();

        update
            .workout_type
            .map(|t| t.as_str().to_string())
            .apply_to(&mut workout.workout_type);
        update.date_time.apply_to(&mut workout.date_time);
        update
            .duration_minutes
            .apply_to_option(&mut workout.duration_minutes);
        update.notes.apply_to_option(&mut workout.notes);
        check_duration(workout.duration_minutes)?;

        if let Some(calories) = update.calories_burned.into_value() {
            workout.calories_burned = Some(calories);
        } else if auto_estimate {
            let weight = self.current_weight(user).await?;
            let workout_type = workout.workout_type.parse().unwrap_or(WorkoutType::Other);
            workout.calories_burned = Some(estimate_calories_burned(
                workout_type,
                weight,
                workout.duration_minutes,
            ));
        }

        let (workout, log) = self.store.save_workout(workout, previous_date).await?;
        info!(event = "workout_updated", workout_id = %id);

        Ok(WorkoutWrite {
            workout: workout.into(),
            daily_log: log.into(),
        })
    }

    async fn delete_workout(&self, user: UserId, id: WorkoutId) -> Result<(), WorkoutError> {
        let workout = self.owned_workout(user, id).await?;
        self.store.delete_workout(&workout).await?;
        info!(event = "workout_deleted", workout_id = %id);
        Ok(())
    }

    async fn find_workouts(
        &self,
        user: UserId,
        range: DateRange,
    ) -> Result<Vec<WorkoutDto>, WorkoutError> {
        let rows = self.store.list_workouts(user.value(), range).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recent_workouts(
        &self,
        user: UserId,
        since: NaiveDate,
        limit: u64,
    ) -> Result<Vec<WorkoutDto>, WorkoutError> {
        let since = since.and_time(NaiveTime::MIN);
        let rows = self
            .store
            .recent_workouts(user.value(), since, limit)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
