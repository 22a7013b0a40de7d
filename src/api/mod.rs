use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

mod admin;
pub mod auth;
mod error;
mod foods;
mod logs;
mod meals;
mod observability;
mod profile;
mod progress;
mod reports;
mod system;
mod types;
pub mod validation;
mod workouts;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_idle_minutes,
        )));

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    Router::new()
        .nest("/api", api_router)
        .merge(crate::web::router())
        .with_state(state)
        .layer(session_layer)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_metrics))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}", axum::routing::delete(admin::delete_user))
        .route("/admin/users/{id}/block", post(admin::block_user))
        .route("/admin/users/{id}/unblock", post(admin::unblock_user))
        .route("/admin/users/{id}/roles", post(admin::change_role))
        .route("/admin/foods", post(foods::create_food))
        .route("/admin/foods/{id}", put(foods::update_food))
        .route("/admin/reports/users", get(admin::users_report))
        .route_layer(middleware::from_fn(auth::admin_middleware));

    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        .route(
            "/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route("/dashboard", get(profile::dashboard))
        .route("/logs", get(logs::list_logs).post(logs::create_log))
        .route(
            "/logs/{id}",
            get(logs::get_log_by_date).delete(logs::delete_log),
        )
        .route("/logs/{id}/notes", put(logs::update_notes))
        .route(
            "/logs/{id}/meals",
            get(meals::list_log_meals).post(meals::add_meal),
        )
        .route("/meals", get(meals::list_user_meals))
        .route(
            "/meals/{id}",
            put(meals::update_meal).delete(meals::delete_meal),
        )
        .route(
            "/workouts",
            get(workouts::list_workouts).post(workouts::add_workout),
        )
        .route(
            "/workouts/{id}",
            put(workouts::update_workout).delete(workouts::delete_workout),
        )
        .route(
            "/progress",
            get(progress::get_history).post(progress::add_progress),
        )
        .route("/reports/weekly", get(reports::weekly))
        .route("/reports/monthly", get(reports::monthly))
        .route("/reports/summary", get(reports::summary))
        .route("/foods/search", get(foods::search))
        .route("/foods/all", get(foods::all_foods))
        .route("/foods/calc", post(foods::calculate))
        .route("/foods/{id}", get(foods::get_food))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
