//! User-initiated deactivation.

use std::sync::Arc;

use chrono::Utc;
use varsel_core::varsel::DeactivationCause;
use varsel_core::CoreError;
use varsel_db::repositories::VarselRepo;
use varsel_db::{DbPool, StoreError};
use varsel_events::{EventBus, LifecycleEvent, VarselDeactivated};

use crate::metrics::LifecycleMetrics;

/// Lets an end user dismiss their own `info` varsler.
///
/// Ownership and type are checked before any mutation; an already-inactive
/// record is treated as success so repeated requests are idempotent.
pub struct DismissService {
    pool: DbPool,
    bus: Arc<EventBus>,
    metrics: Arc<LifecycleMetrics>,
}

impl DismissService {
    pub fn new(pool: DbPool, bus: Arc<EventBus>, metrics: Arc<LifecycleMetrics>) -> Self {
        Self { pool, bus, metrics }
    }

    /// Deactivate `varsel_id` on behalf of `requesting_ident`.
    ///
    /// Errors:
    /// - [`CoreError::NotFound`] if no such record exists.
    /// - [`CoreError::Forbidden`] if the varsel belongs to another user.
    /// - [`CoreError::InvalidType`] unless the type is user-dismissable.
    pub async fn dismiss(&self, varsel_id: &str, requesting_ident: &str) -> Result<(), CoreError> {
        let varsel = VarselRepo::get(&self.pool, varsel_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| CoreError::NotFound {
                entity: "varsel",
                id: varsel_id.to_string(),
            })?;

        if varsel.recipient != requesting_ident {
            return Err(CoreError::Forbidden(
                "varsel belongs to another user".to_string(),
            ));
        }

        if !varsel.varsel_type.is_user_dismissable() {
            return Err(CoreError::InvalidType(format!(
                "users cannot dismiss {} varsler",
                varsel.varsel_type
            )));
        }

        let now = Utc::now();
        let changed =
            VarselRepo::deactivate(&self.pool, varsel_id, DeactivationCause::User, now, None)
                .await
                .map_err(|e| store_error(e.into()))?;

        if changed {
            tracing::info!(varsel_id, "Varsel dismissed by user");
            self.metrics.record_deactivated(DeactivationCause::User);
            self.bus
                .publish(LifecycleEvent::Deactivated(VarselDeactivated {
                    varsel_id: varsel.varsel_id,
                    varsel_type: varsel.varsel_type,
                    producer: varsel.producer,
                    cause: DeactivationCause::User,
                    timestamp: now,
                }));
        } else {
            // Lost a race with another deactivation; idempotent success.
            tracing::info!(varsel_id, "Dismiss requested for already-inactive varsel");
        }

        Ok(())
    }
}

fn store_error(err: StoreError) -> CoreError {
    CoreError::Internal(err.to_string())
}
