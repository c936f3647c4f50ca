use std::sync::Arc;

use varsel_events::EventBus;
use varsel_lifecycle::{DismissService, LifecycleMetrics};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: varsel_db::DbPool,
    /// Server configuration (accessed by the auth extractor and middleware).
    pub config: Arc<ServerConfig>,
    /// Outbound lifecycle event bus.
    pub bus: Arc<EventBus>,
    /// User-initiated deactivation service.
    pub dismiss: Arc<DismissService>,
    /// Lifecycle counters, exposed for sinks wired up by the deployment.
    pub metrics: Arc<LifecycleMetrics>,
}
