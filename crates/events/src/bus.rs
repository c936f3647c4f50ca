//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish side of the outbound contract: lifecycle
//! handlers publish [`LifecycleEvent`]s, and any number of subscribers (the
//! broker bridge, tests) receive every event independently. It is designed
//! to be shared via `Arc<EventBus>`.

use tokio::sync::broadcast;

use crate::event::LifecycleEvent;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for lifecycle events.
///
/// Delivery is send-once: publishing with no subscribers, or past a lagging
/// subscriber's buffer, drops the event. There is no retry loop by design;
/// redelivery belongs to the inbound side.
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is dropped with a log
    /// line and no error.
    pub fn publish(&self, event: LifecycleEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::warn!(varsel_id = %e.0.varsel_id(), "No subscribers, lifecycle event dropped");
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
