//! Closed domain enumerations and value objects for varsel records.
//!
//! The enums here are stored as lowercase strings in Postgres and on the
//! wire. Parsing is strict: an unrecognized string is a `None`, and callers
//! reading storage must treat that as schema drift, never as a silent
//! default.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// VarselType
// ---------------------------------------------------------------------------

/// The closed set of varsel kinds.
///
/// Only [`VarselType::Info`] may be dismissed by the end user; the other
/// types are deactivated by the producer or by expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarselType {
    Info,
    Task,
    Alert,
}

impl VarselType {
    /// Lowercase storage/wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            VarselType::Info => "info",
            VarselType::Task => "task",
            VarselType::Alert => "alert",
        }
    }

    /// Strict parse of the lowercase storage form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(VarselType::Info),
            "task" => Some(VarselType::Task),
            "alert" => Some(VarselType::Alert),
            _ => None,
        }
    }

    /// Whether the end user may dismiss this varsel type themselves.
    pub fn is_user_dismissable(&self) -> bool {
        matches!(self, VarselType::Info)
    }
}

impl std::fmt::Display for VarselType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

/// Authentication strength required before the varsel content may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Substantial,
    High,
}

impl Sensitivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sensitivity::Substantial => "substantial",
            Sensitivity::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "substantial" => Some(Sensitivity::Substantial),
            "high" => Some(Sensitivity::High),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DeactivationCause
// ---------------------------------------------------------------------------

/// Who deactivated a varsel. Set exactly once, mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeactivationCause {
    Producer,
    User,
    Expiry,
}

impl DeactivationCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeactivationCause::Producer => "producer",
            DeactivationCause::User => "user",
            DeactivationCause::Expiry => "expiry",
        }
    }

    /// Strict parse of the lowercase storage form. Unrecognized values are
    /// schema drift and must be surfaced by the caller, not defaulted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "producer" => Some(DeactivationCause::Producer),
            "user" => Some(DeactivationCause::User),
            "expiry" => Some(DeactivationCause::Expiry),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeactivationCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Value objects
// ---------------------------------------------------------------------------

/// The producer system that created a varsel: (namespace, application name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    pub namespace: String,
    pub app_name: String,
}

/// Varsel content: a default text, an optional link, and whatever extra
/// fields the producer attached. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// External notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Email,
}

/// Ordering instructions for external (SMS/email) notification, passed
/// through to the downstream sender on activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPreferences {
    #[serde(default)]
    pub preferred_channels: Vec<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_batch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defer_until: Option<Timestamp>,
}
