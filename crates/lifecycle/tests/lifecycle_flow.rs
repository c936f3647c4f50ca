//! End-to-end lifecycle scenarios against a real Postgres schema.
//!
//! Each test gets its own database via `sqlx::test`. Events are observed
//! through a bus subscription taken before the handlers run; `try_recv`
//! is enough because handlers publish before returning.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;
use varsel_core::varsel::DeactivationCause;
use varsel_core::CoreError;
use varsel_db::repositories::VarselRepo;
use varsel_events::{EventBus, LifecycleEvent};
use varsel_lifecycle::{
    DismissService, DoneHandler, ExpirySweeper, IngestHandler, LeaderElector, LeaderSource,
    LifecycleMetrics, MessageRouter,
};

const OWNER: &str = "12345678901";
const STRANGER: &str = "10987654321";

fn create_payload(varsel_id: &str, varsel_type: &str) -> serde_json::Value {
    json!({
        "@event_name": "create",
        "varsel_id": varsel_id,
        "varsel_type": varsel_type,
        "recipient": OWNER,
        "sensitivity": "high",
        "content": {"text": "you have mail", "link": "https://example.com/case/7"},
        "producer": {"namespace": "team-a", "app_name": "app-1"}
    })
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

struct Fixture {
    pool: PgPool,
    bus: Arc<EventBus>,
    metrics: Arc<LifecycleMetrics>,
}

impl Fixture {
    fn new(pool: PgPool) -> Self {
        Self {
            pool,
            bus: Arc::new(EventBus::default()),
            metrics: Arc::new(LifecycleMetrics::default()),
        }
    }

    fn ingest(&self) -> IngestHandler {
        IngestHandler::new(self.pool.clone(), Arc::clone(&self.bus), Arc::clone(&self.metrics))
    }

    fn done(&self) -> DoneHandler {
        DoneHandler::new(self.pool.clone(), Arc::clone(&self.bus), Arc::clone(&self.metrics))
    }

    fn dismiss(&self) -> DismissService {
        DismissService::new(self.pool.clone(), Arc::clone(&self.bus), Arc::clone(&self.metrics))
    }
}

/// Election source with a fixed answer.
struct StaticLeader(&'static str);

#[async_trait]
impl LeaderSource for StaticLeader {
    async fn current_leader(&self) -> Result<String, varsel_lifecycle::leader::LeaderError> {
        Ok(self.0.to_string())
    }
}

fn sweeper(fx: &Fixture, elected: &'static str) -> ExpirySweeper {
    let elector = LeaderElector::with_interval(
        Box::new(StaticLeader(elected)),
        "this-pod",
        Duration::from_secs(60),
    );
    ExpirySweeper::new(
        fx.pool.clone(),
        Arc::clone(&fx.bus),
        Arc::clone(&fx.metrics),
        elector,
    )
}

// ---

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_create_activates_once(pool: PgPool) {
    let fx = Fixture::new(pool);
    let mut events = fx.bus.subscribe();
    let ingest = fx.ingest();
    let id = new_id();

    ingest.handle(create_payload(&id, "info")).await.unwrap();
    ingest.handle(create_payload(&id, "info")).await.unwrap();

    let stored = VarselRepo::get(&fx.pool, &id).await.unwrap().unwrap();
    assert!(stored.active);

    let first = events.try_recv().unwrap();
    assert_matches!(first, LifecycleEvent::Activated(ref a) if a.varsel_id == id);
    assert_matches!(events.try_recv(), Err(TryRecvError::Empty));
}

#[sqlx::test(migrations = "../../migrations")]
async fn invalid_create_is_rejected_without_side_effects(pool: PgPool) {
    let fx = Fixture::new(pool);
    let mut events = fx.bus.subscribe();
    let id = new_id();

    let mut payload = create_payload(&id, "task");
    payload["content"] = json!({"text": "missing the mandatory link"});
    assert!(fx.ingest().handle(payload).await.is_err());

    assert!(VarselRepo::get(&fx.pool, &id).await.unwrap().is_none());
    assert_matches!(events.try_recv(), Err(TryRecvError::Empty));
}

#[sqlx::test(migrations = "../../migrations")]
async fn user_dismiss_flips_record_once(pool: PgPool) {
    let fx = Fixture::new(pool);
    let id = new_id();
    fx.ingest().handle(create_payload(&id, "info")).await.unwrap();

    let mut events = fx.bus.subscribe();
    let dismiss = fx.dismiss();

    dismiss.dismiss(&id, OWNER).await.unwrap();

    let stored = VarselRepo::get(&fx.pool, &id).await.unwrap().unwrap();
    assert!(!stored.active);
    assert_eq!(stored.deactivated_by, Some(DeactivationCause::User));
    assert!(stored.deactivated_at.is_some());

    let event = events.try_recv().unwrap();
    assert_matches!(
        event,
        LifecycleEvent::Deactivated(ref d)
            if d.varsel_id == id && d.cause == DeactivationCause::User
    );

    // Repeat is idempotent success with no further event.
    dismiss.dismiss(&id, OWNER).await.unwrap();
    assert_matches!(events.try_recv(), Err(TryRecvError::Empty));
}

#[sqlx::test(migrations = "../../migrations")]
async fn dismiss_enforces_ownership_and_type(pool: PgPool) {
    let fx = Fixture::new(pool);
    let info_id = new_id();
    let task_id = new_id();
    fx.ingest().handle(create_payload(&info_id, "info")).await.unwrap();
    fx.ingest().handle(create_payload(&task_id, "task")).await.unwrap();

    let dismiss = fx.dismiss();

    assert_matches!(
        dismiss.dismiss(&info_id, STRANGER).await,
        Err(CoreError::Forbidden(_))
    );
    assert_matches!(
        dismiss.dismiss(&task_id, OWNER).await,
        Err(CoreError::InvalidType(_))
    );
    assert_matches!(
        dismiss.dismiss(&new_id(), OWNER).await,
        Err(CoreError::NotFound { .. })
    );

    // Neither failed attempt touched the records.
    assert!(VarselRepo::get(&fx.pool, &info_id).await.unwrap().unwrap().active);
    assert!(VarselRepo::get(&fx.pool, &task_id).await.unwrap().unwrap().active);
}

#[sqlx::test(migrations = "../../migrations")]
async fn done_message_deactivates_with_producer_cause(pool: PgPool) {
    let fx = Fixture::new(pool);
    let id = new_id();
    fx.ingest().handle(create_payload(&id, "task")).await.unwrap();

    let mut events = fx.bus.subscribe();
    let done = fx.done();

    done.handle(json!({"@event_name": "done", "varsel_id": id}))
        .await
        .unwrap();

    let stored = VarselRepo::get(&fx.pool, &id).await.unwrap().unwrap();
    assert!(!stored.active);
    assert_eq!(stored.deactivated_by, Some(DeactivationCause::Producer));

    let event = events.try_recv().unwrap();
    assert_matches!(
        event,
        LifecycleEvent::Deactivated(ref d) if d.cause == DeactivationCause::Producer
    );

    // A redelivered done message is swallowed without a second event.
    done.handle(json!({"@event_name": "done", "varsel_id": id}))
        .await
        .unwrap();
    assert_matches!(events.try_recv(), Err(TryRecvError::Empty));
}

#[sqlx::test(migrations = "../../migrations")]
async fn done_message_records_when_it_was_applied(pool: PgPool) {
    let fx = Fixture::new(pool);
    let id = new_id();
    fx.ingest().handle(create_payload(&id, "task")).await.unwrap();

    fx.done()
        .handle(json!({"@event_name": "done", "varsel_id": id}))
        .await
        .unwrap();

    let stored = VarselRepo::get(&fx.pool, &id).await.unwrap().unwrap();
    let metadata = stored.metadata.expect("done should leave an audit trail");
    let received_at = metadata["done_event"]["received_at"]
        .as_str()
        .expect("received_at should be a timestamp string");
    let received_at: chrono::DateTime<Utc> = received_at.parse().unwrap();
    // Same instant as the flip; the stored column is truncated to micros.
    let drift = (received_at - stored.deactivated_at.unwrap()).abs();
    assert!(drift < chrono::Duration::milliseconds(1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn done_for_unknown_varsel_is_dropped(pool: PgPool) {
    let fx = Fixture::new(pool);
    let mut events = fx.bus.subscribe();

    fx.done()
        .handle(json!({"@event_name": "done", "varsel_id": new_id()}))
        .await
        .unwrap();

    assert_matches!(events.try_recv(), Err(TryRecvError::Empty));
}

#[sqlx::test(migrations = "../../migrations")]
async fn dismiss_after_done_is_idempotent_success(pool: PgPool) {
    let fx = Fixture::new(pool);
    let id = new_id();
    fx.ingest().handle(create_payload(&id, "info")).await.unwrap();
    fx.done()
        .handle(json!({"@event_name": "done", "varsel_id": id}))
        .await
        .unwrap();

    // The first cause wins; the user request succeeds without changing it.
    fx.dismiss().dismiss(&id, OWNER).await.unwrap();

    let stored = VarselRepo::get(&fx.pool, &id).await.unwrap().unwrap();
    assert_eq!(stored.deactivated_by, Some(DeactivationCause::Producer));
}

#[sqlx::test(migrations = "../../migrations")]
async fn expiry_sweep_deactivates_only_past_deadlines(pool: PgPool) {
    let fx = Fixture::new(pool);
    let expired_id = new_id();
    let pending_id = new_id();

    let mut expired = create_payload(&expired_id, "task");
    expired["expires_at"] = json!(Utc::now() - chrono::Duration::days(7));
    let mut pending = create_payload(&pending_id, "task");
    pending["expires_at"] = json!(Utc::now() + chrono::Duration::days(7));

    let ingest = fx.ingest();
    ingest.handle(expired).await.unwrap();
    ingest.handle(pending).await.unwrap();

    let mut events = fx.bus.subscribe();
    let mut sweeper = sweeper(&fx, "this-pod");
    sweeper.tick().await.unwrap();

    let swept = VarselRepo::get(&fx.pool, &expired_id).await.unwrap().unwrap();
    assert!(!swept.active);
    assert_eq!(swept.deactivated_by, Some(DeactivationCause::Expiry));
    assert!(VarselRepo::get(&fx.pool, &pending_id).await.unwrap().unwrap().active);

    let event = events.try_recv().unwrap();
    assert_matches!(
        event,
        LifecycleEvent::Deactivated(ref d)
            if d.varsel_id == expired_id && d.cause == DeactivationCause::Expiry
    );
    assert_matches!(events.try_recv(), Err(TryRecvError::Empty));

    // A second pass finds nothing left to do.
    sweeper.tick().await.unwrap();
    assert_matches!(events.try_recv(), Err(TryRecvError::Empty));
}

#[sqlx::test(migrations = "../../migrations")]
async fn non_leader_tick_is_inert(pool: PgPool) {
    let fx = Fixture::new(pool);
    let id = new_id();
    let mut payload = create_payload(&id, "task");
    payload["expires_at"] = json!(Utc::now() - chrono::Duration::days(7));
    fx.ingest().handle(payload).await.unwrap();

    let mut events = fx.bus.subscribe();
    let mut sweeper = sweeper(&fx, "some-other-pod");
    sweeper.tick().await.unwrap();

    assert!(VarselRepo::get(&fx.pool, &id).await.unwrap().unwrap().active);
    assert_matches!(events.try_recv(), Err(TryRecvError::Empty));
}

#[sqlx::test(migrations = "../../migrations")]
async fn router_dispatches_by_event_name(pool: PgPool) {
    let fx = Fixture::new(pool);
    let router = MessageRouter::new(fx.ingest(), fx.done());
    let id = new_id();

    router.dispatch(create_payload(&id, "info")).await;
    assert!(VarselRepo::get(&fx.pool, &id).await.unwrap().unwrap().active);

    router
        .dispatch(json!({"@event_name": "done", "varsel_id": id}))
        .await;
    assert!(!VarselRepo::get(&fx.pool, &id).await.unwrap().unwrap().active);

    // Unknown and malformed messages are dropped quietly.
    router.dispatch(json!({"@event_name": "unrelated"})).await;
    router.dispatch(json!({"no_discriminator": true})).await;
}
