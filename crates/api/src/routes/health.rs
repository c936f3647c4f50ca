use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use varsel_lifecycle::metrics::MetricsSnapshot;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Lifecycle counters since process start.
    pub lifecycle: MetricsSnapshot,
}

/// GET /health -- returns service health, database reachability, and the
/// lifecycle counters.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = varsel_db::health_check(&state.pool).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        lifecycle: state.metrics.snapshot(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
