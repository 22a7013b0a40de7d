use super::daily_log::recompute_totals;
use crate::entities::{daily_logs, meals, prelude::*};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

/// Meal columns supplied by the caller; the id and owning log are assigned here.
#[derive(Debug, Clone)]
pub struct NewMealRow {
    pub meal_type: String,
    pub food_name: String,
    pub serving_size: String,
    pub calories: Option<i32>,
    pub protein: Option<f32>,
    pub carbs: Option<f32>,
    pub fats: Option<f32>,
}

/// Every write recomputes the owning log's totals inside the same transaction.
pub struct MealRepository {
    conn: DatabaseConnection,
}

impl MealRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        log: &daily_logs::Model,
        row: NewMealRow,
    ) -> Result<(meals::Model, daily_logs::Model)> {
        let txn = self.conn.begin().await?;

        let meal = meals::ActiveModel {
            id: Set(Uuid::new_v4()),
            daily_log_id: Set(log.id),
            meal_type: Set(row.meal_type),
            food_name: Set(row.food_name),
            serving_size: Set(row.serving_size),
            calories: Set(row.calories),
            protein: Set(row.protein),
            carbs: Set(row.carbs),
            fats: Set(row.fats),
        }
        .insert(&txn)
        .await
        .context("Failed to insert meal")?;

        let log = recompute_totals(&txn, log.user_id, log.date)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Daily log {} vanished during meal insert", log.id))?;

        txn.commit().await?;
        Ok((meal, log))
    }

    /// Meal together with the log that owns it.
    pub async fn get_with_log(
        &self,
        id: Uuid,
    ) -> Result<Option<(meals::Model, daily_logs::Model)>> {
        let row = Meals::find_by_id(id)
            .find_also_related(DailyLogs)
            .one(&self.conn)
            .await?;

        Ok(row.and_then(|(meal, log)| log.map(|log| (meal, log))))
    }

    pub async fn save(
        &self,
        meal: meals::Model,
        log: &daily_logs::Model,
    ) -> Result<(meals::Model, daily_logs::Model)> {
        let txn = self.conn.begin().await?;

        let active: meals::ActiveModel = meal.into();
        let meal = active.reset_all().update(&txn).await?;

        let log = recompute_totals(&txn, log.user_id, log.date)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Daily log {} vanished during meal update", log.id))?;

        txn.commit().await?;
        Ok((meal, log))
    }

    pub async fn delete(&self, id: Uuid, log: &daily_logs::Model) -> Result<daily_logs::Model> {
        let txn = self.conn.begin().await?;

        Meals::delete_by_id(id).exec(&txn).await?;

        let log = recompute_totals(&txn, log.user_id, log.date)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Daily log {} vanished during meal delete", log.id))?;

        txn.commit().await?;
        Ok(log)
    }

    pub async fn list_for_log(&self, daily_log_id: Uuid) -> Result<Vec<meals::Model>> {
        Ok(Meals::find()
            .filter(meals::Column::DailyLogId.eq(daily_log_id))
            .order_by_asc(meals::Column::MealType)
            .all(&self.conn)
            .await?)
    }

    /// All of a user's meals, newest log date first, then by meal type.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(meals::Model, daily_logs::Model)>> {
        let rows = Meals::find()
            .find_also_related(DailyLogs)
            .filter(daily_logs::Column::UserId.eq(user_id))
            .order_by_desc(daily_logs::Column::Date)
            .order_by_asc(meals::Column::MealType)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(meal, log)| log.map(|log| (meal, log)))
            .collect())
    }
}
