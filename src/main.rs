//! Villa Cache - admin server
//!
//! Hosts one process-wide cache with file-backed persistence and exposes
//! its admin surface over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use villa_cache::api::{create_router, AppState};
use villa_cache::storage::FileStorage;
use villa_cache::{spawn_sweep_task, Cache, Config};

/// Main entry point for the cache admin server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache, hydrating it from the last snapshot
/// 4. Start background TTL sweep task
/// 5. Serve the admin router on the configured port
/// 6. On SIGINT/SIGTERM stop the sweeper and flush a snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "villa_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Villa Cache admin server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl={:?}, sweep_interval={:?}, persist={}, port={}",
        config.cache.max_entries,
        config.cache.default_ttl,
        config.cache.sweep_interval,
        config.cache.persist,
        config.server_port
    );

    let storage = Arc::new(FileStorage::new(&config.storage_dir));
    info!("Snapshots stored under {}", storage.dir().display());
    let cache = Cache::builder(config.cache.clone())
        .storage(storage)
        .build();
    info!("Cache initialized with {} entries", cache.len());

    let sweeper = spawn_sweep_task(cache.clone());

    let app = create_router(AppState::new(cache.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    warn!("Sweep task aborted");

    if cache.persist() {
        info!("Cache snapshot flushed");
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
