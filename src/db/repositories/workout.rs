use super::daily_log::{ensure_log, recompute_totals};
use crate::domain::DateRange;
use crate::entities::{daily_logs, prelude::*, workouts};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewWorkoutRow {
    pub user_id: Uuid,
    pub date_time: NaiveDateTime,
    pub workout_type: String,
    pub duration_minutes: Option<i32>,
    pub calories_burned: Option<i32>,
    pub notes: Option<String>,
}

pub struct WorkoutRepository {
    conn: DatabaseConnection,
}

impl WorkoutRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the workout and refresh the totals of that day's log,
    /// creating the log if the user has none for that date yet.
    pub async fn insert(&self, row: NewWorkoutRow) -> Result<(workouts::Model, daily_logs::Model)> {
        let txn = self.conn.begin().await?;

        let workout = workouts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(row.user_id),
            date_time: Set(row.date_time),
            workout_type: Set(row.workout_type),
            duration_minutes: Set(row.duration_minutes),
            calories_burned: Set(row.calories_burned),
            notes: Set(row.notes),
        }
        .insert(&txn)
        .await
        .context("Failed to insert workout")?;

        let log = refresh_day(&txn, workout.user_id, workout.date_time.date()).await?;

        txn.commit().await?;
        Ok((workout, log))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<workouts::Model>> {
        Ok(Workouts::find_by_id(id).one(&self.conn).await?)
    }

    /// Persist an edited workout. When its date moved, the previous day's log
    /// is refreshed as well.
    pub async fn save(
        &self,
        workout: workouts::Model,
        previous_date: NaiveDate,
    ) -> Result<(workouts::Model, daily_logs::Model)> {
        let txn = self.conn.begin().await?;

        let active: workouts::ActiveModel = workout.into();
        let workout = active.reset_all().update(&txn).await?;

        let new_date = workout.date_time.date();
        if previous_date != new_date {
            recompute_totals(&txn, workout.user_id, previous_date).await?;
        }
        let log = refresh_day(&txn, workout.user_id, new_date).await?;

        txn.commit().await?;
        Ok((workout, log))
    }

    pub async fn delete(&self, workout: &workouts::Model) -> Result<Option<daily_logs::Model>> {
        let txn = self.conn.begin().await?;

        Workouts::delete_by_id(workout.id).exec(&txn).await?;
        let log = recompute_totals(&txn, workout.user_id, workout.date_time.date()).await?;

        txn.commit().await?;
        Ok(log)
    }

    /// Workouts between `start 00:00` and `end + 1 00:00`, oldest first.
    pub async fn list(&self, user_id: Uuid, range: DateRange) -> Result<Vec<workouts::Model>> {
        Ok(Self::range_query(user_id, range)
            .order_by_asc(workouts::Column::DateTime)
            .all(&self.conn)
            .await?)
    }

    pub async fn count(&self, user_id: Uuid, range: DateRange) -> Result<u64> {
        Ok(Self::range_query(user_id, range).count(&self.conn).await?)
    }

    /// Newest workouts at or after `since`.
    pub async fn recent(
        &self,
        user_id: Uuid,
        since: NaiveDateTime,
        limit: u64,
    ) -> Result<Vec<workouts::Model>> {
        Ok(Workouts::find()
            .filter(workouts::Column::UserId.eq(user_id))
            .filter(workouts::Column::DateTime.gte(since))
            .order_by_desc(workouts::Column::DateTime)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }

    fn range_query(user_id: Uuid, range: DateRange) -> Select<Workouts> {
        let mut query = Workouts::find().filter(workouts::Column::UserId.eq(user_id));
        if let Some(start) = range.start_timestamp() {
            query = query.filter(workouts::Column::DateTime.gte(start));
        }
        if let Some(end) = range.end_timestamp_exclusive() {
            query = query.filter(workouts::Column::DateTime.lt(end));
        }
        query
    }
}

async fn refresh_day(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<daily_logs::Model> {
    let log = ensure_log(txn, user_id, date).await?;
    recompute_totals(txn, user_id, date)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Daily log {} vanished during recompute", log.id))
}
