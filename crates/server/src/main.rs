use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mirror_core::config::LogFormat;
use mirror_core::{
    load_config, validate_config, Connector, ReqwestConnector, SeriesStore, SqliteSeriesStore,
    SyncOrchestrator, SyncService,
};
use mirror_server::api::create_router;
use mirror_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("MIRROR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // The log format comes from the config, so load it before logging is up
    let loaded = load_config(&config_path);
    init_logging(
        loaded
            .as_ref()
            .map(|config| config.logging.format)
            .unwrap_or_default(),
    );

    info!("Loading configuration from {:?}", config_path);
    let config =
        loaded.with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Relation policy: {:?}", config.sync.relation_policy);

    // Open the local mirror
    let store = SqliteSeriesStore::new(&config.database.path, &config.remote.site_base_url)
        .context("Failed to open series store")?
        .with_relation_policy(config.sync.relation_policy);
    store
        .ensure_schema()
        .context("Failed to prepare series schema")?;
    let store: Arc<dyn SeriesStore> = Arc::new(store);
    info!("Series store initialized");

    // Remote catalog client
    let connector: Arc<dyn Connector> = Arc::new(
        ReqwestConnector::new(Duration::from_secs(config.remote.request_timeout_secs))
            .context("Failed to create HTTP client")?,
    );

    let orchestrator = SyncOrchestrator::from_config(
        &config.remote,
        &config.sync,
        connector,
        Arc::clone(&store),
    );
    let sync = Arc::new(SyncService::new(Arc::new(orchestrator)));

    if config.sync.run_on_start {
        let cycle_id = sync.start().await.context("Failed to start initial sync")?;
        info!("Initial sync cycle {} started", cycle_id);
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        Arc::clone(&sync),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    sync.shutdown().await;
    info!("Sync service stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
