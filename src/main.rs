//! duracache - A lightweight persistent in-memory cache server
//!
//! Redis-like functionality with TTL expiration, LRU eviction and durable
//! recovery via an append-only command log plus periodic snapshots.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duracache::api::create_router;
use duracache::cache::CacheStore;
use duracache::{spawn_cleanup_task, spawn_snapshot_task, AppState, Config};

/// Main entry point for the duracache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the data directory and recover the cache (snapshot + AOF replay)
/// 4. Start background cleanup and snapshot tasks
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM, stop the background tasks and close the cache
#[tokio::main]
async fn main() {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duracache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting duracache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: aof_path={}, snapshot_path={}, max_keys={}, \
         snapshot_interval={}s, cleanup_interval={}s, port={}",
        config.aof_path,
        config.snapshot_path,
        config.max_keys,
        config.snapshot_interval,
        config.cleanup_interval,
        config.server_port
    );

    // Ensure the data directories exist before touching any files
    for path in [&config.aof_path, &config.snapshot_path] {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    error!("Failed to create data directory {}: {}", parent.display(), err);
                    std::process::exit(1);
                }
            }
        }
    }

    // Recover durable state: snapshot first, then AOF replay
    let store = match CacheStore::open(
        Path::new(&config.aof_path),
        Path::new(&config.snapshot_path),
        config.max_keys,
    ) {
        Ok(store) => store,
        Err(err) => {
            error!("Failed to initialize cache: {}", err);
            std::process::exit(1);
        }
    };
    let state = AppState::new(store);
    info!("Cache store initialized");

    let cleanup_handle = spawn_cleanup_task(state.cache.clone(), config.cleanup_interval);
    let snapshot_handle = spawn_snapshot_task(
        state.cache.clone(),
        PathBuf::from(&config.snapshot_path),
        config.snapshot_interval,
    );
    info!("Background tasks started");

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };
    info!("Server listening on http://{}", addr);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }

    // Background tasks must be stopped before the store is closed
    cleanup_handle.abort();
    snapshot_handle.abort();

    if let Err(err) = state.cache.write().await.close() {
        warn!("Error closing cache: {}", err);
    }

    info!("Server shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
