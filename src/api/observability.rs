//! Per-request span, the `http_request_finished` event and HTTP metrics.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, Span, field, info, info_span};
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::UserId;

/// Caller resolved by the auth layer, passed back out on the response so
/// the request span can carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestUser(pub UserId);

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// `api` for the JSON API, `web` for the HTML pages.
fn surface(path: &str) -> &'static str {
    if path == "/api" || path.starts_with("/api/") {
        "api"
    } else {
        "web"
    }
}

fn outcome(status: u16) -> &'static str {
    match status {
        500.. => "error",
        400..=499 => "client_error",
        _ => "success",
    }
}

/// Records `http_requests_total` and `http_request_duration_seconds`,
/// labelled by method, route template, status and surface.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());
    let surface = surface(&path);

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %path,
        route = route.clone(),
        surface,
        user_id = field::Empty,
    );

    async move {
        let response = next.run(req).await;

        if let Some(RequestUser(user_id)) = response.extensions().get::<RequestUser>() {
            Span::current().record("user_id", field::display(user_id));
        }

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = response.status().as_u16();

        // Unrouted paths share one label.
        let labels = [
            ("method", method),
            ("route", route.unwrap_or_else(|| "unmatched".to_string())),
            ("status", status.to_string()),
            ("surface", surface.to_string()),
        ];

        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(start.elapsed().as_secs_f64());

        info!(
            event = "http_request_finished",
            duration_ms,
            status_code = status,
            outcome = outcome(status),
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_splits_api_from_pages() {
        assert_eq!(surface("/api/workouts"), "api");
        assert_eq!(surface("/api"), "api");
        assert_eq!(surface("/apiary"), "web");
        assert_eq!(surface("/logs/2024-03-04"), "web");
        assert_eq!(surface("/"), "web");
    }

    #[test]
    fn test_outcome_by_status() {
        assert_eq!(outcome(200), "success");
        assert_eq!(outcome(303), "success");
        assert_eq!(outcome(404), "client_error");
        assert_eq!(outcome(502), "error");
    }
}
