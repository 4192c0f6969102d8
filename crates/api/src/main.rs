use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use admissions_api::config::ServerConfig;
use admissions_api::router::build_app_router;
use admissions_api::sessions::start_sweeper;
use admissions_api::state::AppState;
use admissions_events::{build_mailer, EmailConfig, EventBus, NotificationDispatcher};
use admissions_storage::StorageConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "admissions_api=debug,admissions_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        consent_policy = ?config.consent_policy,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = admissions_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    admissions_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    admissions_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Object storage ---
    let storage_config = StorageConfig::from_env().expect("Invalid storage configuration");
    let storage = admissions_storage::connect(&storage_config)
        .await
        .expect("Failed to initialise object storage");
    tracing::info!(backend = storage_config.backend_name(), "Object storage ready");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // Spawn the notification dispatcher (renders and sends emails).
    let mailer = build_mailer(EmailConfig::from_env()).expect("Failed to configure mailer");
    tracing::info!(mailer = mailer.kind(), "Mailer configured");
    let dispatcher = NotificationDispatcher::new(mailer, config.portal_name.clone());
    let dispatcher_handle = tokio::spawn(dispatcher.run(event_bus.subscribe()));

    // --- App state ---
    let state = AppState::new(
        pool,
        Arc::new(config.clone()),
        Arc::clone(&event_bus),
        storage,
    );
    let sessions = Arc::clone(&state.sessions);

    // --- Idle session sweeper ---
    let sweeper_handle = start_sweeper(Arc::clone(&sessions));

    // --- Router ---
    let app = build_app_router(
        state,
        &config,
        storage_config.local_dir().map(|p| p.as_path()),
    );

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

    sweeper_handle.abort();
    sessions.clear().await;

    // Closing the bus lets the dispatcher drain and exit.
    drop(event_bus);
    if tokio::time::timeout(config.shutdown_timeout(), dispatcher_handle)
        .await
        .is_err()
    {
        tracing::warn!("Notification dispatcher did not stop in time");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
