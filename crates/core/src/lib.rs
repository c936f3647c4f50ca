//! Shared domain types for the varsel authority.
//!
//! A "varsel" is a user-facing notification record with a controlled
//! lifecycle: created by a producer system, active until exactly one
//! deactivation (by the producer, the end user, or expiry), then terminal.

pub mod error;
pub mod types;
pub mod varsel;

pub use error::CoreError;
