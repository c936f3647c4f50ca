//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod varsel_repo;

pub use varsel_repo::{CreateOutcome, VarselRepo};
