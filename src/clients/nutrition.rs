use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::NutritionConfig;

/// One page of `/api/foods/search` results.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPage {
    #[serde(default)]
    pub content: Vec<FoodItem>,
    #[serde(default)]
    pub total_elements: i64,
    #[serde(default)]
    pub total_pages: i32,
    #[serde(default)]
    pub number: i32,
    #[serde(default)]
    pub size: i32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
    #[serde(default)]
    pub number_of_elements: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub serving_size_grams: Option<i32>,
    #[serde(default)]
    pub calories_per_serving: Option<i32>,
    #[serde(default)]
    pub protein_per_serving: Option<f64>,
    #[serde(default)]
    pub carbs_per_serving: Option<f64>,
    #[serde(default)]
    pub fat_per_serving: Option<f64>,
    #[serde(default)]
    pub fiber_per_serving: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Food record as the catalogue's CRUD endpoints exchange it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDto {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
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

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalcRequest {
    food_item_id: Uuid,
    portion_in_grams: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalcResponse {
    pub food_item_id: Uuid,
    pub food_name: String,
    pub portion_in_grams: f64,
    pub totals: NutritionTotals,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NutritionTotals {
    #[serde(default)]
    pub calories: Option<i32>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    /// The service calls this field `fat`.
    #[serde(rename = "fat", default)]
    pub fats: Option<f64>,
    #[serde(default)]
    pub fiber: Option<f64>,
}

/// REST client for the external food catalogue.
#[derive(Clone)]
pub struct NutritionClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
    retry: bool,
}

impl NutritionClient {
    pub fn new(config: &NutritionConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("FitTrack/1.0")
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to build nutrition HTTP client")?;
        Self::with_shared_client(client, config)
    }

    pub fn with_shared_client(client: Client, config: &NutritionConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid nutrition base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Invalid nutrition base URL: {}", config.base_url));
        }

        Ok(Self {
            client,
            base_url,
            timeout: Duration::from_secs(config.timeout_seconds),
            retry: config.retry,
        })
    }

    /// Appends `segments` to the base URL, keeping any path prefix it has.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("Nutrition base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn search(&self, name: &str) -> Result<FoodPage> {
        let mut url = self.endpoint(&["api", "foods", "search"])?;
        url.query_pairs_mut().append_pair("name", name);

        debug!(query = name, "Searching nutrition catalogue");
        self.execute(|| self.client.get(url.clone())).await
    }

    pub async fn get(&self, id: i64) -> Result<FoodDto> {
        let id = id.to_string();
        let url = self.endpoint(&["api", "foods", id.as_str()])?;
        self.execute(|| self.client.get(url.clone())).await
    }

    pub async fn create(&self, food: &FoodDto) -> Result<FoodDto> {
        let url = self.endpoint(&["api", "foods"])?;
        self.execute(|| self.client.post(url.clone()).json(food))
            .await
    }

    pub async fn update(&self, id: i64, food: &FoodDto) -> Result<FoodDto> {
        let id = id.to_string();
        let url = self.endpoint(&["api", "foods", id.as_str()])?;
        self.execute(|| self.client.put(url.clone()).json(food))
            .await
    }

    pub async fn calculate(&self, food_item_id: Uuid, portion_in_grams: f64) -> Result<CalcResponse> {
        let url = self.endpoint(&["api", "foods", "calc"])?;
        let body = CalcRequest {
            food_item_id,
            portion_in_grams,
        };

        debug!(%food_item_id, portion_in_grams, "Requesting nutrition calculation");
        self.execute(|| self.client.post(url.clone()).json(&body))
            .await
    }

    /// Send the request, retrying once on transport errors and 5xx answers
    /// when retries are enabled. Other non-2xx statuses fail immediately.
    async fn execute<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let attempts = if self.retry { 2 } else { 1 };
        let mut last_error = None;

        for attempt in 1..=attempts {
            match build().timeout(self.timeout).send().await {
                Ok(response) if response.status().is_server_error() => {
                    let err = api_error(response).await;
                    if attempt < attempts {
                        warn!(attempt, error = %err, "Nutrition service failed, retrying");
                    }
                    last_error = Some(err);
                }
                Ok(response) if !response.status().is_success() => {
                    return Err(api_error(response).await);
                }
                Ok(response) => {
                    return response
                        .json::<T>()
                        .await
                        .context("Failed to decode nutrition service response");
                }
                Err(e) => {
                    if attempt < attempts {
                        warn!(attempt, error = %e, "Nutrition service unreachable, retrying");
                    }
                    last_error = Some(anyhow!(e).context("Failed to reach nutrition service"));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Nutrition request was never sent")))
    }
}

async fn api_error(response: Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow!("Nutrition API error: {} - {}", status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_map_fat_to_fats() {
        let json = r#"{
            "foodItemId": "5f0c6a44-1d3b-4a8e-9d6e-2b8f1f4e7a10",
            "foodName": "Apple",
            "portionInGrams": 150.0,
            "totals": {"calories": 78, "protein": 0.4, "carbs": 21.0, "fat": 0.3, "fiber": 3.6}
        }"#;

        let calc: CalcResponse = serde_json::from_str(json).unwrap();
        assert_eq!(calc.totals.calories, Some(78));
        assert_eq!(calc.totals.fats, Some(0.3));
        assert!((calc.portion_in_grams - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_page_tolerates_missing_metadata() {
        let page: FoodPage =
            serde_json::from_str(r#"{"content":[{"id":"a","name":"Rice"}]}"#).unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].serving_size_grams, None);
        assert_eq!(page.total_elements, 0);
    }

    fn client_for(base_url: &str) -> NutritionClient {
        let config = NutritionConfig {
            base_url: base_url.to_string(),
            ..NutritionConfig::default()
        };
        NutritionClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let client = client_for("http://gateway.local/food-service");
        assert_eq!(
            client.endpoint(&["api", "foods", "search"]).unwrap().as_str(),
            "http://gateway.local/food-service/api/foods/search"
        );

        let client = client_for("http://gateway.local/food-service/");
        assert_eq!(
            client.endpoint(&["api", "foods", "7"]).unwrap().as_str(),
            "http://gateway.local/food-service/api/foods/7"
        );

        let client = client_for("http://localhost:8081");
        assert_eq!(
            client.endpoint(&["api", "foods", "calc"]).unwrap().as_str(),
            "http://localhost:8081/api/foods/calc"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = NutritionConfig {
            base_url: "not a url".to_string(),
            ..NutritionConfig::default()
        };
        assert!(NutritionClient::new(&config).is_err());

        let config = NutritionConfig {
            base_url: "mailto:foods@example.com".to_string(),
            ..NutritionConfig::default()
        };
        assert!(NutritionClient::new(&config).is_err());
    }
}
