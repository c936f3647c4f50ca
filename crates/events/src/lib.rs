//! Outbound lifecycle events for the varsel authority.
//!
//! - [`LifecycleEvent`] — the canonical event envelope, tagged with
//!   `@event_name` on the wire (`activated` / `deactivated`).
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; the broker bridge subscribes and forwards to
//!   the downstream topic.

pub mod bus;
pub mod event;

pub use bus::EventBus;
pub use event::{LifecycleEvent, VarselActivated, VarselDeactivated};
