/// Errors surfaced by the repository layer.
///
/// Benign conflicts (duplicate create, already-inactive deactivation) are
/// NOT errors; they come back as tagged results so callers must handle the
/// idempotent branch explicitly. `UnknownEnum` is the loud failure for
/// schema drift: a stored string no variant of a closed enum matches.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Unrecognized {kind} value in storage: {value:?}")]
    UnknownEnum { kind: &'static str, value: String },
}
