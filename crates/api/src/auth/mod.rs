//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token validation and test-token generation.

pub mod jwt;
