//! Periodic deactivation of expired varsler.
//!
//! Spawns a background loop that finds active varsler whose `expires_at`
//! has passed, deactivates them in bulk with cause `expiry`, and emits one
//! deactivated event per record. Runs on a fixed interval using
//! `tokio::time::interval`, gated on cached leadership so only one replica
//! in the fleet executes a pass.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use varsel_core::varsel::DeactivationCause;
use varsel_db::error::StoreError;
use varsel_db::repositories::VarselRepo;
use varsel_db::DbPool;
use varsel_events::{EventBus, LifecycleEvent, VarselDeactivated};

use crate::leader::LeaderElector;
use crate::metrics::LifecycleMetrics;

/// How often the sweep runs by default: 10 minutes.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

pub struct ExpirySweeper {
    pool: DbPool,
    bus: Arc<EventBus>,
    metrics: Arc<LifecycleMetrics>,
    elector: LeaderElector,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(
        pool: DbPool,
        bus: Arc<EventBus>,
        metrics: Arc<LifecycleMetrics>,
        elector: LeaderElector,
    ) -> Self {
        let interval_secs: u64 = std::env::var("EXPIRY_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SWEEP_INTERVAL.as_secs());

        Self {
            pool,
            bus,
            metrics,
            elector,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Run the sweep loop until `cancel` is triggered.
    ///
    /// A failed pass is logged and the loop carries on; the next tick
    /// retries from scratch since expired rows stay active until a pass
    /// succeeds.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Expiry sweep job started"
        );

        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Expiry sweep job stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "Expiry sweep: pass failed");
                    }
                }
            }
        }
    }

    /// One timer tick: consult leadership, then sweep.
    ///
    /// A non-leader tick touches neither the store nor the bus.
    pub async fn tick(&mut self) -> Result<(), StoreError> {
        if !self.elector.is_leader().await {
            tracing::debug!("Expiry sweep: not leader, skipping pass");
            return Ok(());
        }
        self.sweep_once().await
    }

    /// Execute a single sweep pass.
    ///
    /// Events are emitted for every record the scan returned, in scan
    /// order. If another replica deactivated some of them between the scan
    /// and the bulk update, the duplicate events are tolerated downstream.
    pub async fn sweep_once(&self) -> Result<(), StoreError> {
        let now = Utc::now();
        let expired = VarselRepo::find_expired_active(&self.pool, now).await?;

        if expired.is_empty() {
            tracing::debug!("Expiry sweep: nothing to deactivate");
            return Ok(());
        }

        let ids: Vec<String> = expired.iter().map(|v| v.varsel_id.clone()).collect();
        let updated = VarselRepo::bulk_deactivate_expired(&self.pool, &ids, now).await?;

        tracing::info!(
            scanned = expired.len(),
            updated,
            "Expiry sweep: deactivated expired varsler"
        );

        for varsel in expired {
            self.metrics.record_deactivated(DeactivationCause::Expiry);
            self.bus.publish(LifecycleEvent::Deactivated(VarselDeactivated {
                varsel_id: varsel.varsel_id,
                varsel_type: varsel.varsel_type,
                producer: varsel.producer,
                cause: DeactivationCause::Expiry,
                timestamp: now,
            }));
        }

        Ok(())
    }
}
