//! Demo data seeding against an in-memory database.

use chrono::NaiveDate;
use fittrack::clients::NutritionClient;
use fittrack::config::Config;
use fittrack::db::Store;
use fittrack::domain::{DateRange, UserId};
use fittrack::services::SeedReport;
use fittrack::state::SharedState;
use std::sync::Arc;

async fn shared_state() -> SharedState {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let store = Store::new(&config.general.database_path)
        .await
        .expect("Failed to open store");
    let nutrition =
        Arc::new(NutritionClient::new(&config.nutrition).expect("Failed to build client"));
    SharedState::with_parts(config, store, nutrition)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

#[tokio::test]
async fn test_seeding_is_idempotent() {
    let state = shared_state().await;

    let first = state.seeder().run(today()).await.expect("first run failed");
    assert_eq!(
        first,
        SeedReport {
            users_created: 2,
            logs_created: 14,
            workouts_created: 20,
            progress_created: 60,
        }
    );

    let second = state.seeder().run(today()).await.expect("second run failed");
    assert_eq!(second, SeedReport::default());
}

#[tokio::test]
async fn test_seeded_accounts_can_log_in() {
    let state = shared_state().await;
    state.seeder().run(today()).await.expect("seeding failed");

    let admin = state.auth.login("admin", "admin123").await.expect("admin login");
    assert_eq!(admin.user.roles.len(), 2);

    let user = state.auth.login("testuser", "test123").await.expect("user login");
    assert_eq!(user.user.roles.len(), 1);
    assert_eq!(user.user.current_weight_kg, Some(65.0));
}

#[tokio::test]
async fn test_seeded_week_has_estimated_workouts() {
    let state = shared_state().await;
    state.seeder().run(today()).await.expect("seeding failed");

    let user = state
        .store
        .get_user_by_username("testuser")
        .await
        .unwrap()
        .expect("testuser missing");
    let user_id = UserId::from(user.id);

    let week = DateRange::between(today() - chrono::Duration::days(6), today());
    let workouts = state.workouts.find_workouts(user_id, week).await.unwrap();
    assert_eq!(workouts.len(), 10);
    assert!(workouts.iter().all(|w| w.calories_burned.unwrap_or(0) > 0));

    let burned: i32 = workouts.iter().filter_map(|w| w.calories_burned).sum();
    let logs = state.daily_logs.get_logs_between(user_id, week).await.unwrap();
    assert_eq!(logs.len(), 7);
    let logged: i32 = logs.iter().map(|l| l.total_calories_out).sum();
    assert_eq!(burned, logged);
}
