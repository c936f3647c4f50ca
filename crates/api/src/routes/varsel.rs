//! Route definitions for the `/varsler` resource.
//!
//! All endpoints require authentication.

use axum::routing::post;
use axum::Router;

use crate::handlers::varsel;
use crate::state::AppState;

/// Routes mounted at `/varsler`.
///
/// ```text
/// POST   /{id}/dismiss    -> dismiss_varsel
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/dismiss", post(varsel::dismiss_varsel))
}
