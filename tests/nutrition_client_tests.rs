//! `NutritionClient` against a throwaway catalogue served on localhost.

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
};
use fittrack::clients::NutritionClient;
use fittrack::config::NutritionConfig;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

const RICE_ID: &str = "0b5e7d1c-8a4f-4c2b-9e31-6f7a2d9c4b11";

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: String, retry: bool) -> NutritionClient {
    NutritionClient::new(&NutritionConfig {
        base_url,
        timeout_seconds: 5,
        retry,
    })
    .unwrap()
}

fn catalogue() -> Router {
    Router::new()
        .route(
            "/api/foods/search",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let name = params.get("name").cloned().unwrap_or_default();
                let content = if name.eq_ignore_ascii_case("rice") {
                    json!([{ "id": RICE_ID, "name": "Rice", "servingSizeGrams": 100, "caloriesPerServing": 130 }])
                } else {
                    json!([])
                };
                Json(json!({ "content": content, "totalElements": 1, "totalPages": 1 }))
            }),
        )
        .route(
            "/api/foods/calc",
            post(|Json(body): Json<Value>| async move {
                let grams = body["portionInGrams"].as_f64().unwrap_or(0.0);
                Json(json!({
                    "foodItemId": body["foodItemId"],
                    "foodName": "Rice",
                    "portionInGrams": grams,
                    "totals": { "calories": (grams * 1.3).round() as i64, "protein": 2.7, "carbs": 28.0, "fat": 0.3 }
                }))
            }),
        )
        .route(
            "/api/foods/{id}",
            get(|Path(id): Path<i64>| async move {
                if id == 7 {
                    Ok(Json(json!({ "id": 7, "name": "Rice", "servingSize": "100g", "calories": 130 })))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        )
}

#[tokio::test]
async fn test_search_and_calculate() {
    let client = client(serve(catalogue()).await, false);

    let page = client.search("rice").await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].calories_per_serving, Some(130));

    let id = Uuid::parse_str(&page.content[0].id).unwrap();
    let calc = client.calculate(id, 200.0).await.unwrap();
    assert_eq!(calc.food_item_id, id);
    assert_eq!(calc.totals.calories, Some(260));
    assert_eq!(calc.totals.fats, Some(0.3));
}

#[tokio::test]
async fn test_get_food_and_missing_food() {
    let client = client(serve(catalogue()).await, false);

    let food = client.get(7).await.unwrap();
    assert_eq!(food.name, "Rice");
    assert_eq!(food.serving_size.as_deref(), Some("100g"));

    let err = client.get(8).await.unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_server_errors_are_retried_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/api/foods/search",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }),
    );
    let base_url = serve(app).await;

    assert!(client(base_url.clone(), true).search("rice").await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    assert!(client(base_url, false).search("rice").await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/api/foods/search",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StatusCode::BAD_REQUEST
            }
        }),
    );

    let client = client(serve(app).await, true);
    assert!(client.search("rice").await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
