//! Domain service for meals recorded against a daily log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DailyLogId, MealId, MealType, Patch, UserId};
use crate::entities::meals;
use crate::services::daily_log_service::DailyLogDto;

#[derive(Debug, Error)]
pub enum MealError {
    #[error("Meal not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for MealError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for MealError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDto {
    pub id: MealId,
    pub daily_log_id: DailyLogId,
    pub meal_type: Option<MealType>,
    pub food_name: String,
    pub serving_size: String,
    pub calories: Option<i32>,
    pub protein: Option<f32>,
    pub carbs: Option<f32>,
    pub fats: Option<f32>,
}

impl From<meals::Model> for MealDto {
    fn from(model: meals::Model) -> Self {
        Self {
            id: model.id.into(),
            daily_log_id: model.daily_log_id.into(),
            meal_type: model.meal_type.parse().ok(),
            food_name: model.food_name,
            serving_size: model.serving_size,
            calories: model.calories,
            protein: model.protein,
            carbs: model.carbs,
            fats: model.fats,
        }
    }
}

/// A meal together with the date of the log it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedMeal {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub meal: MealDto,
}

/// Result of a meal write: the meal plus the log with refreshed totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealWrite {
    pub meal: MealDto,
    pub daily_log: DailyLogDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMeal {
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub food_name: Option<String>,
    #[serde(default)]
    pub serving_size: Option<String>,
    #[serde(default)]
    pub calories: Option<i32>,
    #[serde(default)]
    pub protein: Option<f32>,
    #[serde(default)]
    pub carbs: Option<f32>,
    #[serde(default)]
    pub fats: Option<f32>,
}

/// Missing and `null` fields are both left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MealUpdate {
    pub meal_type: Patch<MealType>,
    pub food_name: Patch<String>,
    pub serving_size: Patch<String>,
    pub calories: Patch<i32>,
    pub protein: Patch<f32>,
    pub carbs: Patch<f32>,
    pub fats: Patch<f32>,
}

#[async_trait::async_trait]
pub trait MealService: Send + Sync {
    /// Adds a meal to one of the user's logs. Missing calories are looked up
    /// from the nutrition service; a failed lookup stores the meal without them.
    async fn add_meal(
        &self,
        user: UserId,
        daily_log_id: DailyLogId,
        meal: NewMeal,
    ) -> Result<MealWrite, MealError>;

    async fn update_meal(
        &self,
        user: UserId,
        meal_id: MealId,
        update: MealUpdate,
    ) -> Result<MealWrite, MealError>;

    /// Returns the owning log with refreshed totals.
    async fn delete_meal(&self, user: UserId, meal_id: MealId) -> Result<DailyLogDto, MealError>;

    async fn list_meals(
        &self,
        user: UserId,
        daily_log_id: DailyLogId,
    ) -> Result<Vec<MealDto>, MealError>;

    /// Every meal of the user, newest log first, then by meal type.
    async fn list_user_meals(&self, user: UserId) -> Result<Vec<DatedMeal>, MealError>;
}
