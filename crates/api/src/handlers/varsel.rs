//! Handlers for the `/varsler` resource.
//!
//! All endpoints require authentication via [`AuthUser`].

use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// POST /api/v1/varsler/{id}/dismiss
///
/// Deactivate one of the authenticated user's own varsler. Only the
/// lowest-severity type can be dismissed this way; ownership and type are
/// enforced by the lifecycle service.
pub async fn dismiss_varsel(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(varsel_id): Path<String>,
) -> AppResult<StatusCode> {
    state.dismiss.dismiss(&varsel_id, &auth.ident).await?;
    Ok(StatusCode::NO_CONTENT)
}
