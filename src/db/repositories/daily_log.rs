use crate::domain::DateRange;
use crate::entities::{daily_logs, meals, prelude::*, workouts};
use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

/// Repository for daily logs and their derived calorie totals
pub struct DailyLogRepository {
    conn: DatabaseConnection,
}

impl DailyLogRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<daily_logs::Model>> {
        Ok(DailyLogs::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_by_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<daily_logs::Model>> {
        find_for_date(&self.conn, user_id, date).await
    }

    /// Return the existing log for the date, or create one with zero totals.
    ///
    /// Non-blank `notes` overwrite the notes of an existing log; blank notes
    /// leave them untouched.
    pub async fn create_or_update(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Result<(daily_logs::Model, bool)> {
        let txn = self.conn.begin().await?;

        let result = if let Some(existing) = find_for_date(&txn, user_id, date).await? {
            if let Some(notes) = notes {
                let mut model: daily_logs::ActiveModel = existing.into();
                model.notes = Set(Some(notes));
                (model.update(&txn).await?, false)
            } else {
                (existing, false)
            }
        } else {
            let model = daily_logs::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                date: Set(date),
                total_calories_in: Set(0),
                total_calories_out: Set(0),
                notes: Set(notes),
            }
            .insert(&txn)
            .await?;
            (model, true)
        };

        txn.commit().await?;
        Ok(result)
    }

    pub async fn update_notes(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<Option<daily_logs::Model>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut model: daily_logs::ActiveModel = existing.into();
        model.notes = Set(notes);
        Ok(Some(model.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let txn = self.conn.begin().await?;

        Meals::delete_many()
            .filter(meals::Column::DailyLogId.eq(id))
            .exec(&txn)
            .await?;

        let result = DailyLogs::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    /// Logs for the user inside the range, oldest first.
    pub async fn list_between(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<daily_logs::Model>> {
        let mut query = DailyLogs::find().filter(daily_logs::Column::UserId.eq(user_id));

        if let Some(start) = range.start {
            query = query.filter(daily_logs::Column::Date.gte(start));
        }
        if let Some(end) = range.end {
            query = query.filter(daily_logs::Column::Date.lte(end));
        }

        Ok(query
            .order_by_asc(daily_logs::Column::Date)
            .all(&self.conn)
            .await?)
    }

    /// Delete every log (and its meals) dated strictly before `cutoff`.
    pub async fn delete_before(&self, cutoff: NaiveDate) -> Result<u64> {
        let txn = self.conn.begin().await?;

        let stale_logs = Query::select()
            .column(daily_logs::Column::Id)
            .from(DailyLogs)
            .and_where(daily_logs::Column::Date.lt(cutoff))
            .to_owned();

        Meals::delete_many()
            .filter(meals::Column::DailyLogId.in_subquery(stale_logs))
            .exec(&txn)
            .await?;

        let result = DailyLogs::delete_many()
            .filter(daily_logs::Column::Date.lt(cutoff))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(result.rows_affected)
    }

    pub async fn recompute_totals(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<daily_logs::Model>> {
        recompute_totals(&self.conn, user_id, date).await
    }
}

pub(crate) async fn find_for_date<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Option<daily_logs::Model>> {
    Ok(DailyLogs::find()
        .filter(daily_logs::Column::UserId.eq(user_id))
        .filter(daily_logs::Column::Date.eq(date))
        .one(db)
        .await?)
}

/// Fetch the user's log for the date, inserting an empty one when missing.
pub(crate) async fn ensure_log<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<daily_logs::Model> {
    if let Some(existing) = find_for_date(db, user_id, date).await? {
        return Ok(existing);
    }

    Ok(daily_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        date: Set(date),
        total_calories_in: Set(0),
        total_calories_out: Set(0),
        notes: Set(None),
    }
    .insert(db)
    .await?)
}

/// Rewrite the cached totals of the user's log for `date`.
///
/// Calories in are the non-null calories of the log's meals; calories out are
/// the non-null burns of workouts with `date <= date_time < date + 1`.
/// Returns `None` when the user has no log for that date.
pub(crate) async fn recompute_totals<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Option<daily_logs::Model>> {
    let Some(log) = find_for_date(db, user_id, date).await? else {
        return Ok(None);
    };

    let meal_calories: Vec<Option<i32>> = Meals::find()
        .select_only()
        .column(meals::Column::Calories)
        .filter(meals::Column::DailyLogId.eq(log.id))
        .into_tuple()
        .all(db)
        .await?;
    let calories_in: i32 = meal_calories.into_iter().flatten().sum();

    let day = DateRange::between(date, date);
    let mut workout_query = Workouts::find()
        .select_only()
        .column(workouts::Column::CaloriesBurned)
        .filter(workouts::Column::UserId.eq(user_id));
    if let Some(start) = day.start_timestamp() {
        workout_query = workout_query.filter(workouts::Column::DateTime.gte(start));
    }
    if let Some(end) = day.end_timestamp_exclusive() {
        workout_query = workout_query.filter(workouts::Column::DateTime.lt(end));
    }
    let burned: Vec<Option<i32>> = workout_query.into_tuple().all(db).await?;
    let calories_out: i32 = burned.into_iter().flatten().sum();

    debug!(
        user_id = %user_id,
        %date,
        calories_in,
        calories_out,
        "Recomputed daily totals"
    );

    if log.total_calories_in == calories_in && log.total_calories_out == calories_out {
        return Ok(Some(log));
    }

    let mut model: daily_logs::ActiveModel = log.into();
    model.total_calories_in = Set(calories_in);
    model.total_calories_out = Set(calories_out);
    Ok(Some(model.update(db).await?))
}
