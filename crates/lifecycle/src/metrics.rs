//! Lifecycle counters.
//!
//! The authority only counts; formatting/exporting belongs to whatever sink
//! the deployment wires up around [`LifecycleMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use varsel_core::varsel::DeactivationCause;

/// Monotonic lifecycle counters, shared via `Arc`.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
    activated: AtomicU64,
    deactivated_producer: AtomicU64,
    deactivated_user: AtomicU64,
    deactivated_expiry: AtomicU64,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub activated: u64,
    pub deactivated_producer: u64,
    pub deactivated_user: u64,
    pub deactivated_expiry: u64,
}

impl LifecycleMetrics {
    pub fn record_activated(&self) {
        self.activated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deactivated(&self, cause: DeactivationCause) {
        let counter = match cause {
            DeactivationCause::Producer => &self.deactivated_producer,
            DeactivationCause::User => &self.deactivated_user,
            DeactivationCause::Expiry => &self.deactivated_expiry,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            activated: self.activated.load(Ordering::Relaxed),
            deactivated_producer: self.deactivated_producer.load(Ordering::Relaxed),
            deactivated_user: self.deactivated_user.load(Ordering::Relaxed),
            deactivated_expiry: self.deactivated_expiry.load(Ordering::Relaxed),
        }
    }
}
