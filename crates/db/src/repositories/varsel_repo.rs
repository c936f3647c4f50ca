//! Repository for the `varsel` table.

use sqlx::types::Json;
use sqlx::PgPool;
use varsel_core::types::Timestamp;
use varsel_core::varsel::DeactivationCause;

use crate::error::StoreError;
use crate::models::varsel::{ExpiredVarsel, ExpiredVarselRow, NewVarsel, Varsel, VarselRow};

/// Column list for full `varsel` queries.
const COLUMNS: &str = "varsel_id, varsel_type, recipient, sensitivity, content, producer, \
     channel_prefs, active, created_at, expires_at, deactivated_at, deactivated_by, metadata";

/// Outcome of an insert attempt. A duplicate id is not an error: ingestion
/// is idempotent under at-least-once delivery, and the caller decides
/// whether to skip downstream publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Provides lifecycle operations for varsel records.
pub struct VarselRepo;

impl VarselRepo {
    /// Insert a new varsel with `active = true`.
    ///
    /// A primary-key conflict maps to [`CreateOutcome::AlreadyExists`]
    /// instead of an error.
    pub async fn create(pool: &PgPool, varsel: &NewVarsel) -> Result<CreateOutcome, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO varsel (\
                 varsel_id, varsel_type, recipient, sensitivity, content, producer, \
                 channel_prefs, active, created_at, expires_at, metadata\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, true, $8, $9, $10) \
             ON CONFLICT (varsel_id) DO NOTHING",
        )
        .bind(&varsel.varsel_id)
        .bind(varsel.varsel_type.as_str())
        .bind(&varsel.recipient)
        .bind(varsel.sensitivity.as_str())
        .bind(Json(&varsel.content))
        .bind(Json(&varsel.producer))
        .bind(varsel.channel_prefs.as_ref().map(Json))
        .bind(varsel.created_at)
        .bind(varsel.expires_at)
        .bind(varsel.metadata.as_ref().map(Json))
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(CreateOutcome::Created)
        } else {
            Ok(CreateOutcome::AlreadyExists)
        }
    }

    /// Fetch a varsel by id.
    pub async fn get(pool: &PgPool, varsel_id: &str) -> Result<Option<Varsel>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM varsel WHERE varsel_id = $1");
        let row = sqlx::query_as::<_, VarselRow>(&query)
            .bind(varsel_id)
            .fetch_optional(pool)
            .await?;

        row.map(Varsel::try_from).transpose()
    }

    /// Deactivate a varsel, conditioned on it still being active.
    ///
    /// A single atomic statement: the deactivation triple flips together and
    /// a second attempt matches zero rows. Optional `metadata` is merged
    /// into the existing JSONB column. Returns whether a row was changed.
    pub async fn deactivate(
        pool: &PgPool,
        varsel_id: &str,
        cause: DeactivationCause,
        now: Timestamp,
        metadata: Option<&serde_json::Value>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE varsel SET \
                 active = false, \
                 deactivated_at = $2, \
                 deactivated_by = $3, \
                 metadata = coalesce(metadata, '{}'::jsonb) || coalesce($4, '{}'::jsonb) \
             WHERE varsel_id = $1 AND active = true",
        )
        .bind(varsel_id)
        .bind(now)
        .bind(cause.as_str())
        .bind(metadata.map(Json))
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All active varsler whose expiry deadline has passed.
    ///
    /// The projection carries exactly what the deactivated event needs.
    pub async fn find_expired_active(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<ExpiredVarsel>, StoreError> {
        let rows = sqlx::query_as::<_, ExpiredVarselRow>(
            "SELECT varsel_id, varsel_type, producer FROM varsel \
             WHERE active = true AND expires_at IS NOT NULL AND expires_at <= $1 \
             ORDER BY expires_at",
        )
        .bind(now)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(ExpiredVarsel::try_from).collect()
    }

    /// Expire the given ids in one statement, conditioned on `active = true`.
    ///
    /// Rows deactivated by another cause since the scan are left untouched.
    /// Returns the number of rows changed.
    pub async fn bulk_deactivate_expired(
        pool: &PgPool,
        varsel_ids: &[String],
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE varsel SET \
                 active = false, \
                 deactivated_at = $2, \
                 deactivated_by = 'expiry' \
             WHERE varsel_id = ANY($1) AND active = true",
        )
        .bind(varsel_ids)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
