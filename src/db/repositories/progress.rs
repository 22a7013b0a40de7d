use crate::domain::DateRange;
use crate::entities::{prelude::*, progress_entries};
use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

pub struct ProgressRepository {
    conn: DatabaseConnection,
}

impl ProgressRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        weight_kg: f64,
        notes: Option<String>,
    ) -> Result<progress_entries::Model> {
        Ok(progress_entries::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            date: Set(date),
            weight_kg: Set(weight_kg),
            notes: Set(notes),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        }
        .insert(&self.conn)
        .await?)
    }

    /// Entries in the range ordered by date; same-day entries keep insertion order.
    pub async fn history(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<progress_entries::Model>> {
        let mut query =
            ProgressEntries::find().filter(progress_entries::Column::UserId.eq(user_id));

        if let Some(start) = range.start {
            query = query.filter(progress_entries::Column::Date.gte(start));
        }
        if let Some(end) = range.end {
            query = query.filter(progress_entries::Column::Date.lte(end));
        }

        Ok(query
            .order_by_asc(progress_entries::Column::Date)
            .order_by_asc(progress_entries::Column::CreatedAt)
            .all(&self.conn)
            .await?)
    }

    pub async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<progress_entries::Model>> {
        Ok(ProgressEntries::find()
            .filter(progress_entries::Column::UserId.eq(user_id))
            .order_by_desc(progress_entries::Column::Date)
            .order_by_desc(progress_entries::Column::CreatedAt)
            .one(&self.conn)
            .await?)
    }

    /// Latest entry per user, keyed by user id.
    pub async fn latest_for_all(&self) -> Result<HashMap<Uuid, progress_entries::Model>> {
        let rows = ProgressEntries::find()
            .order_by_asc(progress_entries::Column::Date)
            .order_by_asc(progress_entries::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        // Ascending order means later rows overwrite earlier ones.
        Ok(rows.into_iter().map(|row| (row.user_id, row)).collect())
    }
}
