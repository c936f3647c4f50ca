//! Producer-initiated deactivation via `done` messages.

use std::sync::Arc;

use chrono::Utc;
use varsel_core::varsel::DeactivationCause;
use varsel_db::repositories::VarselRepo;
use varsel_db::{DbPool, StoreError};
use varsel_events::{EventBus, LifecycleEvent, VarselDeactivated};

use crate::messages::DoneMessage;
use crate::metrics::LifecycleMetrics;

#[derive(Debug, thiserror::Error)]
pub enum DoneError {
    #[error("done message has invalid json shape: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Handles inbound `done` messages from producer systems.
pub struct DoneHandler {
    pool: DbPool,
    bus: Arc<EventBus>,
    metrics: Arc<LifecycleMetrics>,
}

impl DoneHandler {
    pub fn new(pool: DbPool, bus: Arc<EventBus>, metrics: Arc<LifecycleMetrics>) -> Self {
        Self { pool, bus, metrics }
    }

    /// Process one `done` message.
    ///
    /// A missing record is tolerated (the create may never arrive); an
    /// already-inactive record publishes nothing. Only a changed row emits
    /// the `deactivated` event.
    pub async fn handle(&self, message: serde_json::Value) -> Result<(), DoneError> {
        let msg: DoneMessage = serde_json::from_value(message)?;

        let Some(varsel) = VarselRepo::get(&self.pool, &msg.varsel_id).await? else {
            tracing::warn!(varsel_id = %msg.varsel_id, "No varsel found for done message, dropping");
            return Ok(());
        };

        let now = Utc::now();
        // Audit trail on the record itself: when the done message was applied.
        let metadata = serde_json::json!({"done_event": {"received_at": now}});
        let changed = VarselRepo::deactivate(
            &self.pool,
            &msg.varsel_id,
            DeactivationCause::Producer,
            now,
            Some(&metadata),
        )
        .await?;

        if changed {
            tracing::info!(varsel_id = %msg.varsel_id, "Varsel deactivated by producer");
            self.metrics.record_deactivated(DeactivationCause::Producer);
            self.bus
                .publish(LifecycleEvent::Deactivated(VarselDeactivated {
                    varsel_id: varsel.varsel_id,
                    varsel_type: varsel.varsel_type,
                    producer: varsel.producer,
                    cause: DeactivationCause::Producer,
                    timestamp: now,
                }));
        } else {
            tracing::info!(varsel_id = %msg.varsel_id, "Done message for already-inactive varsel");
        }

        Ok(())
    }
}
