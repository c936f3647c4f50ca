//! Shared helpers for API integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use varsel_api::auth::jwt::{generate_access_token, JwtConfig};
use varsel_api::config::ServerConfig;
use varsel_api::router::build_app_router;
use varsel_api::state::AppState;
use varsel_events::EventBus;
use varsel_lifecycle::{DismissService, LifecycleMetrics};

/// Build a test `ServerConfig` with safe defaults and a known JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// Mirrors the wiring in `main.rs` so integration tests exercise the same
/// middleware stack that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let bus = Arc::new(EventBus::default());
    let metrics = Arc::new(LifecycleMetrics::default());

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        bus: Arc::clone(&bus),
        dismiss: Arc::new(DismissService::new(pool, bus, Arc::clone(&metrics))),
        metrics,
    };

    build_app_router(state, &config)
}

/// A `Bearer <token>` header value for the given user ident.
pub fn bearer(ident: &str) -> String {
    let token = generate_access_token(ident, &test_config().jwt)
        .expect("token generation should succeed");
    format!("Bearer {token}")
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Issue an authenticated POST request against the app.
pub async fn post_as(app: Router, uri: &str, ident: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", bearer(ident))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}
