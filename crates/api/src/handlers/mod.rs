//! Request handlers for the HTTP edge.
//!
//! Handlers delegate to the lifecycle services and map errors via
//! [`crate::error::AppError`].

pub mod varsel;
