//! Browser flows: form login, session cookie, flash messages.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use fittrack::clients::NutritionClient;
use fittrack::config::Config;
use fittrack::db::Store;
use fittrack::services::RegisterUser;
use fittrack::state::SharedState;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let store = Store::new(&config.general.database_path)
        .await
        .expect("Failed to open store");
    let nutrition =
        Arc::new(NutritionClient::new(&config.nutrition).expect("Failed to build client"));
    let shared = Arc::new(SharedState::with_parts(config, store, nutrition));

    shared
        .auth
        .register(RegisterUser {
            username: "walker".to_string(),
            email: "walker@example.com".to_string(),
            password: "secret1".to_string(),
            ..RegisterUser::default()
        })
        .await
        .expect("Failed to register user");

    fittrack::api::router(fittrack::api::create_app_state(shared, None))
}

fn form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn page(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` of the session cookie set by the response, if any.
fn session_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_pages_redirect_to_login_without_session() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(page("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");

    let response = app.clone().oneshot(page("/dashboard", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_failed_login_leaves_flash() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(form("/login", "username=walker&password=nope", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cookie = session_cookie(&response).expect("flash needs a session");

    let response = app
        .clone()
        .oneshot(page("/login", Some(&cookie)))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("Invalid credentials"));

    // Flash messages are shown once.
    let response = app
        .clone()
        .oneshot(page("/login", Some(&cookie)))
        .await
        .unwrap();
    assert!(!body_text(response).await.contains("Invalid credentials"));
}

#[tokio::test]
async fn test_login_then_browse_logs() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(form("/login", "username=walker&password=secret1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
    let cookie = session_cookie(&response).expect("login sets a session cookie");

    let response = app
        .clone()
        .oneshot(page("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("walker"));

    let response = app
        .clone()
        .oneshot(form("/logs", "date=2024-03-04&notes=Long+walk", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/logs/2024-03-04");

    let response = app
        .clone()
        .oneshot(page("/logs/2024-03-04", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Daily log saved"));
    assert!(html.contains("Long walk"));

    let response = app
        .clone()
        .oneshot(page("/logs/2024-03-05", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/logs/new?date=2024-03-05");

    // The session also authenticates the JSON API.
    let response = app
        .clone()
        .oneshot(page("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(form("/logout", "", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(page("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
}
