//! Domain service for food lookups backed by the nutrition microservice.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

use crate::clients::NutritionClient;
use crate::clients::nutrition::{CalcResponse, FoodDto, FoodPage};

#[derive(Debug, Error)]
pub enum FoodError {
    /// Nutrition calculation or search failed; surfaced to callers as a bad request.
    #[error("{0}")]
    LookupFailed(String),

    /// The catalogue rejected or failed a CRUD call.
    #[error("Nutrition service error: {0}")]
    Upstream(String),
}

/// Remote catalogue operations. [`NutritionClient`] is the production
/// implementation; tests substitute an in-process stub.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    async fn search(&self, name: &str) -> anyhow::Result<FoodPage>;

    async fn get(&self, id: i64) -> anyhow::Result<FoodDto>;

    async fn create(&self, food: &FoodDto) -> anyhow::Result<FoodDto>;

    async fn update(&self, id: i64, food: &FoodDto) -> anyhow::Result<FoodDto>;

    async fn calculate(&self, food_item_id: Uuid, portion_in_grams: f64)
    -> anyhow::Result<CalcResponse>;
}

#[async_trait]
impl NutritionLookup for NutritionClient {
    async fn search(&self, name: &str) -> anyhow::Result<FoodPage> {
        Self::search(self, name).await
    }

    async fn get(&self, id: i64) -> anyhow::Result<FoodDto> {
        Self::get(self, id).await
    }

    async fn create(&self, food: &FoodDto) -> anyhow::Result<FoodDto> {
        Self::create(self, food).await
    }

    async fn update(&self, id: i64, food: &FoodDto) -> anyhow::Result<FoodDto> {
        Self::update(self, id, food).await
    }

    async fn calculate(
        &self,
        food_item_id: Uuid,
        portion_in_grams: f64,
    ) -> anyhow::Result<CalcResponse> {
        Self::calculate(self, food_item_id, portion_in_grams).await
    }
}

/// Nutrition values for a named food and serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCalculation {
    pub food_name: String,
    pub serving_size: Option<String>,
    pub portions: Option<f64>,
    pub calories: Option<i32>,
    pub protein: Option<f32>,
    pub carbs: Option<f32>,
    pub fats: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodSearchItem {
    pub id: String,
    pub name: String,
    pub serving_size: String,
    pub calories: Option<i32>,
}

#[async_trait]
pub trait FoodService: Send + Sync {
    /// Looks the food up by name and asks the catalogue for the nutrition of
    /// `serving` times `portions`.
    ///
    /// # Errors
    ///
    /// Every failure is reported as [`FoodError::LookupFailed`].
    async fn calculate_calories(
        &self,
        food_name: &str,
        serving_size: Option<&str>,
        portions: Option<f64>,
    ) -> Result<FoodCalculation, FoodError>;

    /// Never fails; lookup errors produce an empty list.
    async fn search_foods(&self, name: &str) -> Vec<FoodSearchItem>;

    /// Up to roughly 100 foods gathered by probing common letters, sorted by name.
    async fn all_foods(&self) -> Vec<FoodSearchItem>;

    async fn get_food(&self, id: i64) -> Result<FoodDto, FoodError>;

    async fn create_food(&self, food: FoodDto) -> Result<FoodDto, FoodError>;

    async fn update_food(&self, id: i64, food: FoodDto) -> Result<FoodDto, FoodError>;
}

pub const DEFAULT_SERVING_GRAMS: f64 = 100.0;

/// Converts a free-form serving description to grams.
///
/// The first number is taken as grams when the text mentions `g`, otherwise
/// as a cup-like unit of 100 g. Text without a number means 100 g.
#[must_use]
pub fn parse_serving_grams(serving_size: Option<&str>) -> f64 {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("Invalid regex"));

    let Some(text) = serving_size.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_SERVING_GRAMS;
    };

    let Some(value) = re
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
    else {
        return DEFAULT_SERVING_GRAMS;
    };

    if text.to_lowercase().contains('g') {
        value
    } else {
        value * 100.0
    }
}
