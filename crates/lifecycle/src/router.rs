//! Inbound message dispatch.
//!
//! Producer-facing messages arrive on an mpsc channel (fed by whatever
//! broker bridge the deployment uses) as raw JSON. The router inspects the
//! `@event_name` discriminator and hands the message to the matching
//! handler. Unknown event names are logged and dropped so a shared topic
//! can carry message kinds this service does not own.

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::done::DoneHandler;
use crate::ingest::IngestHandler;

pub struct MessageRouter {
    ingest: IngestHandler,
    done: DoneHandler,
}

impl MessageRouter {
    pub fn new(ingest: IngestHandler, done: DoneHandler) -> Self {
        Self { ingest, done }
    }

    /// Route one message by its `@event_name`.
    ///
    /// Handler failures are logged here and not propagated: a malformed or
    /// unprocessable message must never stall the consume loop.
    pub async fn dispatch(&self, message: Value) {
        let event_name = message
            .get("@event_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match event_name.as_str() {
            "create" => {
                if let Err(e) = self.ingest.handle(message).await {
                    tracing::error!(error = %e, "Failed to process create message");
                }
            }
            "done" => {
                if let Err(e) = self.done.handle(message).await {
                    tracing::error!(error = %e, "Failed to process done message");
                }
            }
            other => {
                tracing::debug!(event_name = other, "Ignored message with unknown event name");
            }
        }
    }

    /// Consume messages from `rx` until `cancel` is triggered or the
    /// sending side is dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<Value>, cancel: CancellationToken) {
        tracing::info!("Message router started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Message router stopping");
                    break;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(message) => self.dispatch(message).await,
                        None => {
                            tracing::info!("Inbound channel closed, message router stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}
