//! Cached implementation of the `FoodService` trait.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{CacheStore, FOOD_CACHE, FOOD_SEARCH_CACHE};
use crate::clients::nutrition::{FoodDto, FoodItem};
use crate::services::food_service::{
    FoodCalculation, FoodError, FoodSearchItem, FoodService, NutritionLookup, parse_serving_grams,
};

/// Letters probed by [`FoodService::all_foods`].
const CATALOGUE_PROBES: &str = "aeioubcdfghmprst";

const CATALOGUE_LIMIT: usize = 100;

pub struct DefaultFoodService {
    lookup: Arc<dyn NutritionLookup>,
    cache: Arc<dyn CacheStore>,
}

impl DefaultFoodService {
    #[must_use]
    pub fn new(lookup: Arc<dyn NutritionLookup>, cache: Arc<dyn CacheStore>) -> Self {
        Self { lookup, cache }
    }

    async fn search_uncached(&self, name: &str) -> anyhow::Result<Vec<FoodSearchItem>> {
        let page = self.lookup.search(name).await?;
        Ok(page.content.into_iter().map(to_search_item).collect())
    }
}

fn to_search_item(item: FoodItem) -> FoodSearchItem {
    FoodSearchItem {
        serving_size: item
            .serving_size_grams
            .map_or_else(|| "100g".to_string(), |g| format!("{g}g")),
        calories: item.calories_per_serving,
        id: item.id,
        name: item.name,
    }
}

fn lookup_failed(err: impl std::fmt::Display) -> FoodError {
    FoodError::LookupFailed(format!(
        "Failed to calculate calories from microservice: {err}"
    ))
}

#[allow(clippy::cast_possible_truncation)]
fn to_f32(value: Option<f64>) -> Option<f32> {
    value.map(|v| v as f32)
}

#[async_trait]
impl FoodService for DefaultFoodService {
    async fn calculate_calories(
        &self,
        food_name: &str,
        serving_size: Option<&str>,
        portions: Option<f64>,
    ) -> Result<FoodCalculation, FoodError> {
        let page = self
            .lookup
            .search(food_name)
            .await
            .map_err(lookup_failed)?;

        let item = page
            .content
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(food_name))
            .or_else(|| page.content.first())
            .ok_or_else(|| lookup_failed(format!("Food not found: {food_name}")))?;

        let food_item_id = Uuid::parse_str(&item.id).map_err(lookup_failed)?;

        let mut grams = parse_serving_grams(serving_size);
        if let Some(p) = portions.filter(|p| *p > 0.0) {
            grams *= p;
        }

        debug!(food = %item.name, grams, "Calculating nutrition");
        let calc = self
            .lookup
            .calculate(food_item_id, grams)
            .await
            .map_err(lookup_failed)?;

        Ok(FoodCalculation {
            food_name: food_name.to_string(),
            serving_size: serving_size.map(ToString::to_string),
            portions,
            calories: calc.totals.calories,
            protein: to_f32(calc.totals.protein),
            carbs: to_f32(calc.totals.carbs),
            fats: to_f32(calc.totals.fats),
        })
    }

    async fn search_foods(&self, name: &str) -> Vec<FoodSearchItem> {
        let key = name.trim().to_lowercase();
        if let Some(hit) = self.cache.get_json(FOOD_SEARCH_CACHE, &key).await {
            return hit;
        }

        match self.search_uncached(name).await {
            Ok(items) => {
                self.cache.put_json(FOOD_SEARCH_CACHE, &key, &items).await;
                items
            }
            Err(e) => {
                warn!(query = name, error = %e, "Food search failed");
                Vec::new()
            }
        }
    }

    async fn all_foods(&self) -> Vec<FoodSearchItem> {
        let mut seen = HashSet::new();
        let mut foods = Vec::new();

        for letter in CATALOGUE_PROBES.chars() {
            if foods.len() >= CATALOGUE_LIMIT {
                break;
            }

            match self.search_uncached(&letter.to_string()).await {
                Ok(items) => {
                    for item in items {
                        if seen.insert(item.id.clone()) {
                            foods.push(item);
                        }
                    }
                }
                Err(e) => debug!(%letter, error = %e, "Skipping catalogue probe"),
            }
        }

        foods.sort_by_key(|f| f.name.to_lowercase());
        foods
    }

    async fn get_food(&self, id: i64) -> Result<FoodDto, FoodError> {
        let key = id.to_string();
        if let Some(hit) = self.cache.get_json(FOOD_CACHE, &key).await {
            return Ok(hit);
        }

        let food = self
            .lookup
            .get(id)
            .await
            .map_err(|e| FoodError::Upstream(format!("Failed to get food: {e}")))?;

        self.cache.put_json(FOOD_CACHE, &key, &food).await;
        Ok(food)
    }

    async fn create_food(&self, food: FoodDto) -> Result<FoodDto, FoodError> {
        let created = self
            .lookup
            .create(&food)
            .await
            .map_err(|e| FoodError::Upstream(format!("Failed to create food: {e}")))?;

        if let Some(id) = created.id {
            self.cache.evict(FOOD_CACHE, &id.to_string()).await;
        }
        Ok(created)
    }

    async fn update_food(&self, id: i64, food: FoodDto) -> Result<FoodDto, FoodError> {
        let updated = self
            .lookup
            .update(id, &food)
            .await
            .map_err(|e| FoodError::Upstream(format!("Failed to update food: {e}")))?;

        self.cache.evict(FOOD_CACHE, &id.to_string()).await;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::clients::nutrition::{CalcResponse, FoodPage, NutritionTotals};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    const APPLE_ID: &str = "5f0c6a44-1d3b-4a8e-9d6e-2b8f1f4e7a10";

    #[derive(Default)]
    struct StubLookup {
        searches: AtomicUsize,
        last_grams: Mutex<Option<f64>>,
        failing: bool,
    }

    fn item(id: &str, name: &str, grams: Option<i32>) -> FoodItem {
        FoodItem {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            serving_size_grams: grams,
            calories_per_serving: Some(52),
            protein_per_serving: None,
            carbs_per_serving: None,
            fat_per_serving: None,
            fiber_per_serving: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[async_trait]
    impl NutritionLookup for StubLookup {
        async fn search(&self, name: &str) -> anyhow::Result<FoodPage> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                anyhow::bail!("connection refused");
            }
            let content = match name {
                "apple" => vec![
                    item("x", "Apple pie", Some(120)),
                    item(APPLE_ID, "Apple", Some(100)),
                ],
                "a" => vec![item("1", "banana", None), item("2", "Apple", None)],
                "e" => vec![item("2", "Apple", None), item("3", "egg", Some(50))],
                _ => vec![],
            };
            Ok(FoodPage {
                content,
                ..FoodPage::default()
            })
        }

        async fn get(&self, id: i64) -> anyhow::Result<FoodDto> {
            Ok(FoodDto {
                id: Some(id),
                name: "Rice".to_string(),
                ..FoodDto::default()
            })
        }

        async fn create(&self, food: &FoodDto) -> anyhow::Result<FoodDto> {
            Ok(FoodDto {
                id: Some(7),
                ..food.clone()
            })
        }

        async fn update(&self, id: i64, food: &FoodDto) -> anyhow::Result<FoodDto> {
            Ok(FoodDto {
                id: Some(id),
                ..food.clone()
            })
        }

        async fn calculate(
            &self,
            food_item_id: Uuid,
            portion_in_grams: f64,
        ) -> anyhow::Result<CalcResponse> {
            *self.last_grams.lock().await = Some(portion_in_grams);
            Ok(CalcResponse {
                food_item_id,
                food_name: "Apple".to_string(),
                portion_in_grams,
                totals: NutritionTotals {
                    calories: Some(78),
                    protein: Some(0.5),
                    carbs: Some(20.0),
                    fats: Some(0.25),
                    fiber: None,
                },
            })
        }
    }

    fn service(stub: Arc<StubLookup>) -> DefaultFoodService {
        DefaultFoodService::new(stub, Arc::new(InMemoryCache::new()))
    }

    #[tokio::test]
    async fn test_calculate_prefers_exact_name_and_scales_portions() {
        let stub = Arc::new(StubLookup::default());
        let foods = service(stub.clone());

        let calc = foods
            .calculate_calories("apple", Some("150g"), Some(2.0))
            .await
            .unwrap();

        assert_eq!(calc.calories, Some(78));
        assert_eq!(calc.fats, Some(0.25));
        assert_eq!(*stub.last_grams.lock().await, Some(300.0));
    }

    #[tokio::test]
    async fn test_portions_multiply_serving_grams() {
        let stub = Arc::new(StubLookup::default());
        let foods = service(stub.clone());

        foods
            .calculate_calories("apple", Some("100g"), Some(2.0))
            .await
            .unwrap();
        assert_eq!(*stub.last_grams.lock().await, Some(200.0));

        foods
            .calculate_calories("apple", Some("2 cups"), None)
            .await
            .unwrap();
        assert_eq!(*stub.last_grams.lock().await, Some(200.0));
    }

    #[tokio::test]
    async fn test_calculate_unknown_food_fails() {
        let foods = service(Arc::new(StubLookup::default()));
        let err = foods
            .calculate_calories("durian", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, FoodError::LookupFailed(msg) if msg.contains("Food not found: durian")));
    }

    #[tokio::test]
    async fn test_search_is_cached_and_degrades_to_empty() {
        let stub = Arc::new(StubLookup::default());
        let foods = service(stub.clone());

        let first = foods.search_foods("apple").await;
        let second = foods.search_foods("Apple").await;
        assert_eq!(first, second);
        assert_eq!(first[1].serving_size, "100g");
        assert_eq!(stub.searches.load(Ordering::SeqCst), 1);

        let failing = service(Arc::new(StubLookup {
            failing: true,
            ..StubLookup::default()
        }));
        assert!(failing.search_foods("apple").await.is_empty());
    }

    #[tokio::test]
    async fn test_all_foods_dedupes_and_sorts() {
        let foods = service(Arc::new(StubLookup::default()));
        let all = foods.all_foods().await;

        let names: Vec<_> = all.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "banana", "egg"]);
    }
}
