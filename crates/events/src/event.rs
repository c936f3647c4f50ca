//! Lifecycle event payloads.

use serde::{Deserialize, Serialize};
use varsel_core::types::Timestamp;
use varsel_core::varsel::{
    ChannelPreferences, Content, DeactivationCause, Producer, Sensitivity, VarselType,
};

/// A lifecycle event emitted by this authority.
///
/// Exactly one `activated` event per first-ever successful creation; exactly
/// one `deactivated` event per record, carrying the single cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "@event_name", rename_all = "lowercase")]
pub enum LifecycleEvent {
    Activated(VarselActivated),
    Deactivated(VarselDeactivated),
}

impl LifecycleEvent {
    /// The id of the varsel the event concerns.
    pub fn varsel_id(&self) -> &str {
        match self {
            LifecycleEvent::Activated(e) => &e.varsel_id,
            LifecycleEvent::Deactivated(e) => &e.varsel_id,
        }
    }
}

/// A new varsel has been persisted and should be shown/delivered.
///
/// Carries the full content snapshot plus any external-notification
/// ordering instructions for the downstream sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarselActivated {
    pub varsel_id: String,
    pub varsel_type: VarselType,
    pub recipient: String,
    pub sensitivity: Sensitivity,
    pub content: Content,
    pub producer: Producer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_prefs: Option<ChannelPreferences>,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    /// When the event was emitted (UTC).
    pub timestamp: Timestamp,
}

/// A varsel is no longer active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarselDeactivated {
    pub varsel_id: String,
    pub varsel_type: VarselType,
    pub producer: Producer,
    pub cause: DeactivationCause,
    /// When the event was emitted (UTC).
    pub timestamp: Timestamp,
}
