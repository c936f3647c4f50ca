//! Inbound message DTOs and their validation rules.
//!
//! Malformed or invalid messages are rejected locally (logged, never
//! requeued); validation happens before any storage access.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError};
use varsel_core::types::Timestamp;
use varsel_core::varsel::{ChannelPreferences, Content, Producer, Sensitivity, VarselType};

/// UUID (any version) or ULID.
static VARSEL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "^([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\
         |[0-7][0-9ABCDEFGHJKMNPQRSTVWXYZabcdefghjkmnpqrstvwxyz]{25})$",
    )
    .expect("varsel id pattern must compile")
});

/// Text length cap for `info` varsler.
const MAX_TEXT_INFO: usize = 300;
/// Text length cap for `task` and `alert` varsler.
const MAX_TEXT_OTHER: usize = 500;
/// Link length cap.
const MAX_LINK: usize = 200;
/// SMS override text cap.
const MAX_SMS_TEXT: usize = 160;
/// Email title override cap.
const MAX_EMAIL_TITLE: usize = 40;
/// Email body override cap.
const MAX_EMAIL_TEXT: usize = 4000;

/// Inbound `create` message: all immutable varsel fields.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_rules"))]
pub struct CreateVarsel {
    #[validate(regex(path = *VARSEL_ID_RE, message = "varsel_id must be a UUID or ULID"))]
    pub varsel_id: String,
    pub varsel_type: VarselType,
    #[validate(custom(function = "validate_recipient"))]
    pub recipient: String,
    pub sensitivity: Sensitivity,
    pub content: Content,
    pub producer: Producer,
    #[serde(default)]
    pub channel_prefs: Option<ChannelPreferences>,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Inbound `done` message, keyed by varsel id.
#[derive(Debug, Clone, Deserialize)]
pub struct DoneMessage {
    pub varsel_id: String,
}

/// Recipient idents are 11-digit national identity numbers.
fn validate_recipient(recipient: &str) -> Result<(), ValidationError> {
    if recipient.len() == 11 && recipient.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("recipient").with_message("recipient must be 11 digits".into()))
    }
}

/// Cross-field rules that depend on the varsel type.
fn validate_create_rules(msg: &CreateVarsel) -> Result<(), ValidationError> {
    let fail = |code: &'static str, message: &'static str| {
        Err(ValidationError::new(code).with_message(message.into()))
    };

    let max_text = match msg.varsel_type {
        VarselType::Info => MAX_TEXT_INFO,
        VarselType::Task | VarselType::Alert => MAX_TEXT_OTHER,
    };
    if msg.content.text.trim().is_empty() {
        return fail("text", "content text must not be blank");
    }
    if msg.content.text.chars().count() > max_text {
        return fail("text", "content text exceeds the maximum length for its type");
    }

    match &msg.content.link {
        None => {
            if !matches!(msg.varsel_type, VarselType::Info) {
                return fail("link", "link is required for task and alert varsler");
            }
        }
        Some(link) => {
            let well_formed = (link.starts_with("http://") || link.starts_with("https://"))
                && !link.contains(char::is_whitespace);
            if link.chars().count() > MAX_LINK || !well_formed {
                return fail("link", "link must be a well-formed URL of at most 200 characters");
            }
        }
    }

    if matches!(msg.varsel_type, VarselType::Alert) && msg.expires_at.is_some() {
        return fail("expires_at", "alert varsler do not support an expiry deadline");
    }

    if let Some(prefs) = &msg.channel_prefs {
        if let Some(sms) = &prefs.sms_text {
            if sms.trim().is_empty() || sms.chars().count() > MAX_SMS_TEXT {
                return fail("sms_text", "sms override must be non-blank and at most 160 characters");
            }
        }
        if let Some(title) = &prefs.email_title {
            if title.trim().is_empty() || title.chars().count() > MAX_EMAIL_TITLE {
                return fail(
                    "email_title",
                    "email title override must be non-blank and at most 40 characters",
                );
            }
        }
        if let Some(body) = &prefs.email_text {
            if body.trim().is_empty() || body.chars().count() > MAX_EMAIL_TEXT {
                return fail(
                    "email_text",
                    "email body override must be non-blank and at most 4000 characters",
                );
            }
        }
    }

    Ok(())
}
