//! `SeaORM` implementation of the `MealService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::{NewMealRow, Store};
use crate::domain::{DailyLogId, MealId, UserId};
use crate::entities::{daily_logs, meals};
use crate::services::daily_log_service::DailyLogDto;
use crate::services::food_service::FoodService;
use crate::services::meal_service::{
    DatedMeal, MealDto, MealError, MealService, MealUpdate, MealWrite, NewMeal,
};

pub struct SeaOrmMealService {
    store: Store,
    foods: Arc<dyn FoodService>,
}

impl SeaOrmMealService {
    #[must_use]
    pub fn new(store: Store, foods: Arc<dyn FoodService>) -> Self {
        Self { store, foods }
    }

    async fn owned_log(
        &self,
        user: UserId,
        id: DailyLogId,
    ) -> Result<daily_logs::Model, MealError> {
        self.store
            .get_daily_log(id.value())
            .await?
            .filter(|log| log.user_id == user.value())
            .ok_or_else(|| MealError::NotFound(format!("daily log {id}")))
    }

    async fn owned_meal(
        &self,
        user: UserId,
        id: MealId,
    ) -> Result<(meals::Model, daily_logs::Model), MealError> {
        self.store
            .get_meal_with_log(id.value())
            .await?
            .filter(|(_, log)| log.user_id == user.value())
            .ok_or_else(|| MealError::NotFound(id.to_string()))
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, MealError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MealError::Validation(format!("{field} is required")))
}

#[async_trait]
impl MealService for SeaOrmMealService {
    async fn add_meal(
        &self,
        user: UserId,
        daily_log_id: DailyLogId,
        meal: NewMeal,
    ) -> Result<MealWrite, MealError> {
        let log = self.owned_log(user, daily_log_id).await?;

        let food_name = required(meal.food_name, "Food name")?;
        let serving_size = required(meal.serving_size, "Serving size")?;
        let meal_type = meal
            .meal_type
            .ok_or_else(|| MealError::Validation("Meal type is required".to_string()))?;

        let mut row = NewMealRow {
            meal_type: meal_type.as_str().to_string(),
            food_name,
            serving_size,
            calories: meal.calories,
            protein: meal.protein,
            carbs: meal.carbs,
            fats: meal.fats,
        };

        if row.calories.is_none() {
            debug!(food = %row.food_name, "Looking up nutrition for meal");
            match self
                .foods
                .calculate_calories(&row.food_name, Some(&row.serving_size), Some(1.0))
                .await
            {
                Ok(calc) => {
                    row.calories = calc.calories;
                    row.protein = calc.protein;
                    row.carbs = calc.carbs;
                    row.fats = calc.fats;
                }
                Err(e) => warn!(food = %row.food_name, error = %e, "Failed to calculate calories for meal"),
            }
        }

        let (meal, log) = self.store.insert_meal(&log, row).await?;
        info!(event = "meal_added", meal_id = %meal.id, log_id = %log.id);

        Ok(MealWrite {
            meal: meal.into(),
            daily_log: log.into(),
        })
    }

    async fn update_meal(
        &self,
        user: UserId,
        meal_id: MealId,
        update: MealUpdate,
    ) -> Result<MealWrite, MealError> {
        let (mut meal, log) = self.owned_meal(user, meal_id).await?;

        update
            .meal_type
            .map(|t| t.as_str().to_string())
            .apply_to(&mut meal.meal_type);
        update.food_name.apply_to(&mut meal.food_name);
        update.serving_size.apply_to(&mut meal.serving_size);
        update.calories.apply_to_option(&mut meal.calories);
        update.protein.apply_to_option(&mut meal.protein);
        update.carbs.apply_to_option(&mut meal.carbs);
        update.fats.apply_to_option(&mut meal.fats);

        let (meal, log) = self.store.save_meal(meal, &log).await?;
        info!(event = "meal_updated", meal_id = %meal_id);

        Ok(MealWrite {
            meal: meal.into(),
            daily_log: log.into(),
        })
    }

    async fn delete_meal(&self, user: UserId, meal_id: MealId) -> Result<DailyLogDto, MealError> {
        let (meal, log) = self.owned_meal(user, meal_id).await?;
        let log = self.store.delete_meal(meal.id, &log).await?;
        info!(event = "meal_deleted", meal_id = %meal_id);
        Ok(log.into())
    }

    async fn list_meals(
        &self,
        user: UserId,
        daily_log_id: DailyLogId,
    ) -> Result<Vec<MealDto>, MealError> {
        let log = self.owned_log(user, daily_log_id).await?;
        let meals = self.store.list_meals_for_log(log.id).await?;
        Ok(meals.into_iter().map(Into::into).collect())
    }

    async fn list_user_meals(&self, user: UserId) -> Result<Vec<DatedMeal>, MealError> {
        let rows = self.store.list_meals_for_user(user.value()).await?;
        Ok(rows
            .into_iter()
            .map(|(meal, log)| DatedMeal {
                date: log.date,
                meal: meal.into(),
            })
            .collect())
    }
}
