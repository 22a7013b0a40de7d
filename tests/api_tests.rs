use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fittrack::clients::nutrition::{CalcResponse, FoodDto, FoodItem, FoodPage, NutritionTotals};
use fittrack::config::Config;
use fittrack::db::Store;
use fittrack::services::NutritionLookup;
use fittrack::state::SharedState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const APPLE_ID: &str = "5f0c6a44-1d3b-4a8e-9d6e-2b8f1f4e7a10";

/// Catalogue holding a single food, "Apple", at 52 kcal per 100 g.
struct StubCatalogue;

#[async_trait]
impl NutritionLookup for StubCatalogue {
    async fn search(&self, name: &str) -> anyhow::Result<FoodPage> {
        let content = if "apple".contains(&name.trim().to_lowercase()) && !name.trim().is_empty() {
            vec![FoodItem {
                id: APPLE_ID.to_string(),
                name: "Apple".to_string(),
                description: None,
                serving_size_grams: Some(100),
                calories_per_serving: Some(52),
                protein_per_serving: Some(0.3),
                carbs_per_serving: Some(14.0),
                fat_per_serving: Some(0.2),
                fiber_per_serving: None,
                created_at: None,
                updated_at: None,
            }]
        } else {
            Vec::new()
        };

        Ok(FoodPage {
            total_elements: content.len() as i64,
            content,
            ..FoodPage::default()
        })
    }

    async fn get(&self, id: i64) -> anyhow::Result<FoodDto> {
        Ok(FoodDto {
            id: Some(id),
            name: "Apple".to_string(),
            serving_size: Some("100g".to_string()),
            calories: Some(52),
            ..FoodDto::default()
        })
    }

    async fn create(&self, food: &FoodDto) -> anyhow::Result<FoodDto> {
        Ok(FoodDto {
            id: Some(1),
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
        let scale = portion_in_grams / 100.0;
        Ok(CalcResponse {
            food_item_id,
            food_name: "Apple".to_string(),
            portion_in_grams,
            totals: NutritionTotals {
                calories: Some((52.0 * scale).round() as i32),
                protein: Some(0.3 * scale),
                carbs: Some(14.0 * scale),
                fats: Some(0.2 * scale),
                fiber: None,
            },
        })
    }
}

async fn spawn_app() -> (Arc<SharedState>, Router) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let store = Store::new(&config.general.database_path)
        .await
        .expect("Failed to open store");
    let shared = Arc::new(SharedState::with_parts(
        config,
        store,
        Arc::new(StubCatalogue),
    ));

    let state = fittrack::api::create_app_state(shared.clone(), None);
    (shared, fittrack::api::router(state))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str, key: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Api-Key", key)
        .body(Body::empty())
        .unwrap()
}

fn with_json(method: &str, uri: &str, key: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref());
    if let Some(key) = key {
        builder = builder.header("X-Api-Key", key);
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// Registers `username` and returns its API key.
async fn register_and_login(app: &Router, username: &str, weight: f64) -> String {
    let (status, body) = send(
        app,
        with_json(
            "POST",
            "/api/auth/register",
            None,
            &json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "secret1",
                "current_weight_kg": weight,
                "goal": "LOSE"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

    login(app, username, "secret1").await
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        with_json(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["api_key"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let (_, app) = spawn_app().await;

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["success"].as_bool().unwrap_or(false));
    assert_eq!(body["data"]["status"], "UP");
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_auth_endpoints() {
    let (_, app) = spawn_app().await;

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/api/auth/me")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, get("/api/auth/me", "wrong-key")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let key = register_and_login(&app, "alice", 70.0).await;

    let (status, body) = send(&app, get("/api/auth/me", &key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["roles"], json!(["ROLE_USER"]));
    assert_eq!(body["data"]["goal"], "LOSE");

    let (status, _) = send(
        &app,
        with_json(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "username": "alice", "password": "wrong-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (_, app) = spawn_app().await;
    register_and_login(&app, "bob", 80.0).await;

    let (status, _) = send(
        &app,
        with_json(
            "POST",
            "/api/auth/register",
            None,
            &json!({ "username": "bob", "email": "other@example.com", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_change_password() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "carol", 60.0).await;

    let (status, _) = send(
        &app,
        with_json(
            "PUT",
            "/api/auth/password",
            Some(&key),
            &json!({ "current_password": "secret1", "new_password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        with_json(
            "PUT",
            "/api/auth/password",
            Some(&key),
            &json!({ "current_password": "secret1", "new_password": "secret22" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    login(&app, "carol", "secret22").await;
}

#[tokio::test]
async fn test_profile_patch_keeps_untouched_fields() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "dave", 90.0).await;

    let (status, body) = send(
        &app,
        with_json("PATCH", "/api/profile", Some(&key), &json!({ "age": 41 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["age"], 41);
    assert_eq!(body["data"]["current_weight_kg"], 90.0);
    assert_eq!(body["data"]["goal"], "LOSE");
}

#[tokio::test]
async fn test_logs_meals_and_totals() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "erin", 70.0).await;

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/logs",
            Some(&key),
            &json!({ "date": "2024-03-04", "notes": "Rest day" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let log_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["total_calories_in"], 0);

    // Calories are filled from the catalogue when omitted.
    let (status, body) = send(
        &app,
        with_json(
            "POST",
            &format!("/api/logs/{log_id}/meals"),
            Some(&key),
            &json!({ "meal_type": "BREAKFAST", "food_name": "Apple", "serving_size": "150g" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["meal"]["calories"], 78);
    assert_eq!(body["data"]["daily_log"]["total_calories_in"], 78);

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            &format!("/api/logs/{log_id}/meals"),
            Some(&key),
            &json!({
                "meal_type": "LUNCH",
                "food_name": "Sandwich",
                "serving_size": "1 piece",
                "calories": 420
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let sandwich_id = body["data"]["meal"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["daily_log"]["total_calories_in"], 498);

    let (status, body) = send(
        &app,
        with_json(
            "PUT",
            &format!("/api/meals/{sandwich_id}"),
            Some(&key),
            &json!({ "calories": 400 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meal"]["food_name"], "Sandwich");
    assert_eq!(body["data"]["daily_log"]["total_calories_in"], 478);

    let (status, body) = send(&app, get("/api/logs/2024-03-04", &key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meals"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["daily_log"]["notes"], "Rest day");

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/meals/{sandwich_id}"))
        .header("X-Api-Key", &key)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/logs/2024-03-04", &key)).await;
    assert_eq!(body["data"]["daily_log"]["total_calories_in"], 78);

    let (status, _) = send(&app, get("/api/logs/2024-03-05", &key)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/api/logs/yesterday", &key)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_meal_requires_fields() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "frank", 70.0).await;

    let (_, body) = send(
        &app,
        with_json("POST", "/api/logs", Some(&key), &json!({ "date": "2024-03-04" })),
    )
    .await;
    let log_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        with_json(
            "POST",
            &format!("/api/logs/{log_id}/meals"),
            Some(&key),
            &json!({ "meal_type": "DINNER", "serving_size": "1 bowl" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_users_logs_are_hidden() {
    let (_, app) = spawn_app().await;
    let owner = register_and_login(&app, "grace", 60.0).await;
    let intruder = register_and_login(&app, "heidi", 60.0).await;

    let (_, body) = send(
        &app,
        with_json("POST", "/api/logs", Some(&owner), &json!({ "date": "2024-03-04" })),
    )
    .await;
    let log_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, get(&format!("/api/logs/{log_id}/meals"), &intruder)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_workout_estimate_updates_log() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "ivan", 70.0).await;

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/workouts?auto_estimate=true",
            Some(&key),
            &json!({
                "date_time": "2024-03-04T07:30:00",
                "workout_type": "CARDIO",
                "duration_minutes": 30
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    // 8 MET * 70 kg * 0.5 h
    assert_eq!(body["data"]["workout"]["calories_burned"], 280);
    assert_eq!(body["data"]["daily_log"]["total_calories_out"], 280);
    assert_eq!(body["data"]["daily_log"]["net_calories"], -280);

    let (status, _) = send(
        &app,
        with_json(
            "POST",
            "/api/workouts",
            Some(&key),
            &json!({
                "date_time": "2024-03-04T18:00:00",
                "workout_type": "YOGA",
                "duration_minutes": -5
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        get("/api/workouts?start=2024-03-01&end=2024-03-31", &key),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_workout_partial_update_and_delete() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "ivy", 70.0).await;

    let mut ids = Vec::new();
    for (time, workout_type, calories) in [("07:30:00", "CARDIO", 200), ("18:00:00", "STRENGTH", 150)] {
        let (status, body) = send(
            &app,
            with_json(
                "POST",
                "/api/workouts",
                Some(&key),
                &json!({
                    "date_time": format!("2024-03-04T{time}"),
                    "workout_type": workout_type,
                    "duration_minutes": 30,
                    "calories_burned": calories,
                    "notes": "Park loop"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        ids.push(body["data"]["workout"]["id"].as_str().unwrap().to_string());
    }

    // Only the duration is supplied; everything else stays as stored.
    let (status, body) = send(
        &app,
        with_json(
            "PUT",
            &format!("/api/workouts/{}", ids[0]),
            Some(&key),
            &json!({ "duration_minutes": 45 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let workout = &body["data"]["workout"];
    assert_eq!(workout["duration_minutes"], 45);
    assert_eq!(workout["workout_type"], "CARDIO");
    assert_eq!(workout["date_time"], "2024-03-04T07:30:00");
    assert_eq!(workout["calories_burned"], 200);
    assert_eq!(workout["notes"], "Park loop");
    assert_eq!(body["data"]["daily_log"]["total_calories_out"], 350);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/workouts/{}", ids[1]))
        .header("X-Api-Key", &key)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/logs/2024-03-04", &key)).await;
    assert_eq!(body["data"]["daily_log"]["total_calories_out"], 200);
    assert_eq!(body["data"]["daily_log"]["net_calories"], -200);

    let (_, body) = send(
        &app,
        get("/api/workouts?start=2024-03-04&end=2024-03-04", &key),
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_meal_saved_when_lookup_fails() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "jack", 70.0).await;

    let (_, body) = send(
        &app,
        with_json("POST", "/api/logs", Some(&key), &json!({ "date": "2024-03-04" })),
    )
    .await;
    let log_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            &format!("/api/logs/{log_id}/meals"),
            Some(&key),
            &json!({ "meal_type": "SNACK", "food_name": "Durian", "serving_size": "1 cup" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let meal = &body["data"]["meal"];
    assert_eq!(meal["food_name"], "Durian");
    assert_eq!(meal["calories"], Value::Null);
    assert_eq!(meal["protein"], Value::Null);
    assert_eq!(meal["fats"], Value::Null);
    assert_eq!(body["data"]["daily_log"]["total_calories_in"], 0);

    let (_, body) = send(&app, get(&format!("/api/logs/{log_id}/meals"), &key)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_progress_history_and_trend() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "judy", 72.0).await;

    for (date, weight) in [("2024-03-01", 72.0), ("2024-03-08", 71.2), ("2024-03-15", 70.5)] {
        let (status, _) = send(
            &app,
            with_json(
                "POST",
                "/api/progress",
                Some(&key),
                &json!({ "date": date, "weight_kg": weight }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(
        &app,
        with_json(
            "POST",
            "/api/progress",
            Some(&key),
            &json!({ "date": "2024-03-16", "weight_kg": 0.0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        get("/api/progress?start=2024-03-01&end=2024-03-10", &key),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["trend"]["points"], 2);
    let delta = body["data"]["trend"]["delta"].as_f64().unwrap();
    assert!((delta - (-0.8)).abs() < 1e-9);

    let (status, _) = send(
        &app,
        get("/api/progress?start=2024-03-10&end=2024-03-01", &key),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_summary() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "kim", 70.0).await;

    let (_, body) = send(
        &app,
        with_json(
            "POST",
            "/api/logs",
            Some(&key),
            &json!({ "date": "2024-03-04", "notes": "Felt strong" }),
        ),
    )
    .await;
    let log_id = body["data"]["id"].as_str().unwrap().to_string();

    send(
        &app,
        with_json(
            "POST",
            &format!("/api/logs/{log_id}/meals"),
            Some(&key),
            &json!({ "meal_type": "DINNER", "food_name": "Pasta", "serving_size": "1 plate", "calories": 600 }),
        ),
    )
    .await;
    send(
        &app,
        with_json(
            "POST",
            "/api/workouts",
            Some(&key),
            &json!({
                "date_time": "2024-03-05T07:00:00",
                "workout_type": "STRENGTH",
                "duration_minutes": 45,
                "calories_burned": 300
            }),
        ),
    )
    .await;
    for (date, weight) in [("2024-03-02", 70.0), ("2024-03-09", 69.0)] {
        send(
            &app,
            with_json(
                "POST",
                "/api/progress",
                Some(&key),
                &json!({ "date": date, "weight_kg": weight }),
            ),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        get("/api/reports/summary?start=2024-03-01&end=2024-03-31", &key),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let data = &body["data"];
    assert_eq!(data["total_calories_in"], 600);
    assert_eq!(data["total_calories_out"], 300);
    assert_eq!(data["entries_count"], 1);
    assert!((data["weight_change"].as_f64().unwrap() - (-1.0)).abs() < 1e-9);
    assert_eq!(data["daily_logs_with_notes"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, get("/api/reports/summary?start=2024-03-01", &key)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/api/reports/weekly?week_start=2024-03-04", &key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["end_date"], "2024-03-10");

    // A week running past the last representable date is rejected.
    let (status, body) = send(
        &app,
        get("/api/reports/weekly?week_start=%2B262142-12-30", &key),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, get("/api/reports/monthly?month=2024-02", &key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["start_date"], "2024-02-01");
    assert_eq!(body["data"]["end_date"], "2024-02-29");
    assert_eq!(body["data"]["total_calories_in"], 0);
}

#[tokio::test]
async fn test_food_calculation() {
    let (_, app) = spawn_app().await;
    let key = register_and_login(&app, "leo", 70.0).await;

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/foods/calc",
            Some(&key),
            &json!({ "food_name": "apple", "serving_size": "200g" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["calories"], 104);

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/foods/calc",
            Some(&key),
            &json!({ "food_name": "durian", "serving_size": "100g" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, get("/api/foods/search?name=app", &key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Apple");
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let (shared, app) = spawn_app().await;
    let user_key = register_and_login(&app, "mallory", 70.0).await;

    let (status, _) = send(&app, get("/api/admin/users", &user_key)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    shared
        .seeder()
        .run(chrono::Local::now().date_naive())
        .await
        .expect("seeding failed");
    let admin_key = login(&app, "admin", "admin123").await;

    let (status, body) = send(&app, get("/api/admin/users?role=ADMIN", &admin_key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_elements"], 1);
    assert_eq!(body["data"]["content"][0]["username"], "admin");

    let (status, body) = send(&app, get("/api/admin/users?q=mall", &admin_key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_elements"], 1);
    let user_id = body["data"]["content"][0]["id"].as_str().unwrap().to_string();

    // LIKE wildcards in the keyword match literally.
    let (status, body) = send(&app, get("/api/admin/users?q=%25", &admin_key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_elements"], 0);
    let (_, body) = send(&app, get("/api/admin/users?q=m_ll", &admin_key)).await;
    assert_eq!(body["data"]["total_elements"], 0);

    let (status, _) = send(
        &app,
        get(
            &format!("/api/admin/users?page={}&size=100", u64::MAX),
            &admin_key,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let far_page = shared.users.list_users(u64::MAX, 100).await.unwrap();
    assert!(far_page.content.is_empty());
    assert!(far_page.total_elements >= 3);

    // A user's only role cannot be revoked.
    let (status, _) = send(
        &app,
        with_json(
            "POST",
            &format!("/api/admin/users/{user_id}/roles?role=USER&action=remove"),
            Some(&admin_key),
            &json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            &format!("/api/admin/users/{user_id}/roles?role=ADMIN&action=assign"),
            Some(&admin_key),
            &json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["roles"], json!(["ROLE_USER", "ROLE_ADMIN"]));

    let (status, _) = send(
        &app,
        with_json(
            "POST",
            &format!("/api/admin/users/{user_id}/block"),
            Some(&admin_key),
            &json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Blocked accounts lose API access and cannot log in.
    let (status, _) = send(&app, get("/api/auth/me", &user_key)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(
        &app,
        with_json(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "username": "mallory", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
