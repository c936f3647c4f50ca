//! Varsel lifecycle state machine.
//!
//! This crate owns the canonical lifecycle of varsel records and its three
//! deactivation pathways:
//!
//! - [`IngestHandler`] — consumes `create` messages, inserts idempotently,
//!   emits one `activated` event per first-ever creation.
//! - [`DismissService`] — user-initiated deactivation with ownership and
//!   type checks.
//! - [`DoneHandler`] — producer-initiated deactivation via `done` messages.
//! - [`ExpirySweeper`] — periodic expiry sweep, gated by leader election so
//!   at most one replica executes it in practice.
//! - [`LeaderElector`] — cached leadership status with a minimum re-query
//!   interval.
//! - [`MessageRouter`] — dispatches inbound messages to the handlers; the
//!   broker bridge feeds its channel.

pub mod dismiss;
pub mod done;
pub mod expiry;
pub mod ingest;
pub mod leader;
pub mod messages;
pub mod metrics;
pub mod router;

pub use dismiss::DismissService;
pub use done::DoneHandler;
pub use expiry::ExpirySweeper;
pub use ingest::IngestHandler;
pub use leader::{HttpLeaderSource, LeaderElector, LeaderSource};
pub use metrics::LifecycleMetrics;
pub use router::MessageRouter;
