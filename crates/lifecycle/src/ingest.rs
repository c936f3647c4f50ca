//! Ingestion of `create` messages.
//!
//! Valid messages are inserted with `active = true`; the primary key makes
//! re-delivery a no-op, and only a first-ever insert publishes an
//! `activated` event. Invalid messages are rejected with an error the
//! consumer loop logs — they are never requeued.

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;
use varsel_core::varsel::{ChannelPreferences, VarselType};
use varsel_db::models::NewVarsel;
use varsel_db::repositories::{CreateOutcome, VarselRepo};
use varsel_db::DbPool;
use varsel_events::{EventBus, LifecycleEvent, VarselActivated};

use crate::messages::CreateVarsel;
use crate::metrics::LifecycleMetrics;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("create message has invalid json shape: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("create message failed validation: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Handles inbound `create` messages.
pub struct IngestHandler {
    pool: DbPool,
    bus: Arc<EventBus>,
    metrics: Arc<LifecycleMetrics>,
}

impl IngestHandler {
    pub fn new(pool: DbPool, bus: Arc<EventBus>, metrics: Arc<LifecycleMetrics>) -> Self {
        Self { pool, bus, metrics }
    }

    /// Process one `create` message.
    ///
    /// Exactly one `activated` event is published per first-ever successful
    /// creation; a duplicate id skips publication entirely.
    pub async fn handle(&self, message: serde_json::Value) -> Result<(), IngestError> {
        let msg: CreateVarsel = serde_json::from_value(message)?;
        msg.validate()?;

        let now = Utc::now();
        let varsel = NewVarsel {
            varsel_id: msg.varsel_id,
            varsel_type: msg.varsel_type,
            recipient: msg.recipient,
            sensitivity: msg.sensitivity,
            content: msg.content,
            producer: msg.producer,
            channel_prefs: apply_batching_default(msg.varsel_type, msg.channel_prefs),
            created_at: now,
            expires_at: msg.expires_at,
            metadata: msg.metadata,
        };

        match VarselRepo::create(&self.pool, &varsel).await? {
            CreateOutcome::AlreadyExists => {
                tracing::info!(varsel_id = %varsel.varsel_id, "Ignored duplicate create message");
            }
            CreateOutcome::Created => {
                tracing::info!(
                    varsel_id = %varsel.varsel_id,
                    varsel_type = %varsel.varsel_type,
                    producer_app = %varsel.producer.app_name,
                    "Varsel created"
                );
                self.metrics.record_activated();
                self.bus.publish(LifecycleEvent::Activated(VarselActivated {
                    varsel_id: varsel.varsel_id,
                    varsel_type: varsel.varsel_type,
                    recipient: varsel.recipient,
                    sensitivity: varsel.sensitivity,
                    content: varsel.content,
                    producer: varsel.producer,
                    channel_prefs: varsel.channel_prefs,
                    created_at: varsel.created_at,
                    expires_at: varsel.expires_at,
                    timestamp: now,
                }));
            }
        }

        Ok(())
    }
}

/// Default the `can_batch` ordering flag when the producer left it unset.
///
/// Task and alert varsler are always sent immediately; info varsler may be
/// batched unless the producer supplied custom override texts.
fn apply_batching_default(
    varsel_type: VarselType,
    prefs: Option<ChannelPreferences>,
) -> Option<ChannelPreferences> {
    let mut prefs = prefs?;
    if prefs.can_batch.is_none() {
        let default = match varsel_type {
            VarselType::Task | VarselType::Alert => false,
            VarselType::Info => prefs.sms_text.is_none() && prefs.email_text.is_none(),
        };
        prefs.can_batch = Some(default);
    }
    Some(prefs)
}
