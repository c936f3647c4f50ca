use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use varsel_api::config::ServerConfig;
use varsel_api::router::build_app_router;
use varsel_api::state::AppState;
use varsel_events::EventBus;
use varsel_lifecycle::{
    DismissService, DoneHandler, ExpirySweeper, IngestHandler, LeaderElector, LifecycleMetrics,
    MessageRouter,
};

/// Buffer size for the inbound message channel.
const INBOUND_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "varsel_api=debug,varsel_lifecycle=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = varsel_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    varsel_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    varsel_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus and metrics ---
    let bus = Arc::new(EventBus::default());
    let metrics = Arc::new(LifecycleMetrics::default());

    // --- Inbound message router ---
    // The sender side is held here for the process lifetime; a broker bridge
    // clones it to feed consumed messages into the router.
    let (inbound_tx, inbound_rx) =
        tokio::sync::mpsc::channel::<serde_json::Value>(INBOUND_CHANNEL_CAPACITY);

    let router_cancel = tokio_util::sync::CancellationToken::new();
    let message_router = MessageRouter::new(
        IngestHandler::new(pool.clone(), Arc::clone(&bus), Arc::clone(&metrics)),
        DoneHandler::new(pool.clone(), Arc::clone(&bus), Arc::clone(&metrics)),
    );
    let router_handle = tokio::spawn(message_router.run(inbound_rx, router_cancel.clone()));

    // --- Expiry sweep ---
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let sweeper = ExpirySweeper::new(
        pool.clone(),
        Arc::clone(&bus),
        Arc::clone(&metrics),
        LeaderElector::from_env(),
    );
    let sweep_handle = tokio::spawn(sweeper.run(sweep_cancel.clone()));

    tracing::info!("Lifecycle services started (message router, expiry sweep)");

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        bus: Arc::clone(&bus),
        dismiss: Arc::new(DismissService::new(
            pool,
            Arc::clone(&bus),
            Arc::clone(&metrics),
        )),
        metrics,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop the sweep first; an in-flight tick runs to completion.
    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Expiry sweep stopped");

    // Closing the inbound channel lets the router drain buffered messages.
    drop(inbound_tx);
    router_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), router_handle).await;
    tracing::info!("Message router stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
