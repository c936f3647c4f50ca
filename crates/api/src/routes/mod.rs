pub mod health;
pub mod varsel;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /varsler/{id}/dismiss    user-initiated deactivation (POST, requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/varsler", varsel::router())
}
