//! Varsel entity models.
//!
//! [`VarselRow`] mirrors the `varsel` table (enum columns as raw strings,
//! JSONB columns as [`sqlx::types::Json`]); [`Varsel`] is the parsed domain
//! view. The conversion fails loudly on unrecognized enum strings instead of
//! defaulting, so schema drift is caught at read time.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use varsel_core::types::Timestamp;
use varsel_core::varsel::{
    ChannelPreferences, Content, DeactivationCause, Producer, Sensitivity, VarselType,
};

use crate::error::StoreError;

/// A raw row from the `varsel` table.
#[derive(Debug, Clone, FromRow)]
pub struct VarselRow {
    pub varsel_id: String,
    pub varsel_type: String,
    pub recipient: String,
    pub sensitivity: String,
    pub content: Json<Content>,
    pub producer: Json<Producer>,
    pub channel_prefs: Option<Json<ChannelPreferences>>,
    pub active: bool,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub deactivated_at: Option<Timestamp>,
    pub deactivated_by: Option<String>,
    pub metadata: Option<Json<serde_json::Value>>,
}

/// A fully parsed varsel record.
#[derive(Debug, Clone, Serialize)]
pub struct Varsel {
    pub varsel_id: String,
    pub varsel_type: VarselType,
    pub recipient: String,
    pub sensitivity: Sensitivity,
    pub content: Content,
    pub producer: Producer,
    pub channel_prefs: Option<ChannelPreferences>,
    pub active: bool,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub deactivated_at: Option<Timestamp>,
    pub deactivated_by: Option<DeactivationCause>,
    pub metadata: Option<serde_json::Value>,
}

impl TryFrom<VarselRow> for Varsel {
    type Error = StoreError;

    fn try_from(row: VarselRow) -> Result<Self, Self::Error> {
        let varsel_type =
            VarselType::parse(&row.varsel_type).ok_or_else(|| StoreError::UnknownEnum {
                kind: "varsel_type",
                value: row.varsel_type.clone(),
            })?;

        let sensitivity =
            Sensitivity::parse(&row.sensitivity).ok_or_else(|| StoreError::UnknownEnum {
                kind: "sensitivity",
                value: row.sensitivity.clone(),
            })?;

        let deactivated_by = row
            .deactivated_by
            .as_deref()
            .map(|value| {
                DeactivationCause::parse(value).ok_or_else(|| StoreError::UnknownEnum {
                    kind: "deactivated_by",
                    value: value.to_string(),
                })
            })
            .transpose()?;

        Ok(Varsel {
            varsel_id: row.varsel_id,
            varsel_type,
            recipient: row.recipient,
            sensitivity,
            content: row.content.0,
            producer: row.producer.0,
            channel_prefs: row.channel_prefs.map(|j| j.0),
            active: row.active,
            created_at: row.created_at,
            expires_at: row.expires_at,
            deactivated_at: row.deactivated_at,
            deactivated_by,
            metadata: row.metadata.map(|j| j.0),
        })
    }
}

/// Fields for inserting a new varsel. `active = true` is implied; the
/// deactivation triple starts out null.
#[derive(Debug, Clone)]
pub struct NewVarsel {
    pub varsel_id: String,
    pub varsel_type: VarselType,
    pub recipient: String,
    pub sensitivity: Sensitivity,
    pub content: Content,
    pub producer: Producer,
    pub channel_prefs: Option<ChannelPreferences>,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub metadata: Option<serde_json::Value>,
}

/// Projection returned by the expiry scan: exactly what the deactivated
/// event needs.
#[derive(Debug, Clone)]
pub struct ExpiredVarsel {
    pub varsel_id: String,
    pub varsel_type: VarselType,
    pub producer: Producer,
}

/// Raw expiry-scan row, parsed into [`ExpiredVarsel`] by the repository.
#[derive(Debug, FromRow)]
pub struct ExpiredVarselRow {
    pub varsel_id: String,
    pub varsel_type: String,
    pub producer: Json<Producer>,
}

impl TryFrom<ExpiredVarselRow> for ExpiredVarsel {
    type Error = StoreError;

    fn try_from(row: ExpiredVarselRow) -> Result<Self, Self::Error> {
        let varsel_type =
            VarselType::parse(&row.varsel_type).ok_or_else(|| StoreError::UnknownEnum {
                kind: "varsel_type",
                value: row.varsel_type.clone(),
            })?;

        Ok(ExpiredVarsel {
            varsel_id: row.varsel_id,
            varsel_type,
            producer: row.producer.0,
        })
    }
}
