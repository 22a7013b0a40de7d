use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiResponse, AppState, HealthStatus};

/// GET /health
/// Public liveness probe; also reports whether the database answers.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthStatus>> {
    let database = match state.shared.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed");
            false
        }
    };

    Json(ApiResponse::success(HealthStatus {
        status: if database { "UP" } else { "DEGRADED" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.start_time.elapsed().as_secs(),
        database,
    }))
}
