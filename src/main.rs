//! Assetgate - A caching gateway for CMS-backed sites
//!
//! Fronts a CMS-driven site with layered asset resolution and classified
//! response caching.

mod api;
mod config;
mod error;
mod gateway;
mod models;
mod resolve;
mod store;
mod tasks;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::Config;
use gateway::{Gateway, HttpUpstream};
use resolve::{AssetResolver, HttpAssetLookup};
use store::{AssetKind, CacheDb};
use tasks::spawn_sweep_task;

/// Main entry point for the Assetgate caching gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the persistent store and run migrations
/// 4. Construct the resolvers and the gateway
/// 5. Bootstrap the gateway (warm the shell space, drop stale spaces)
/// 6. Start the background expiry sweep
/// 7. Start the HTTP server on the configured port
/// 8. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assetgate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Assetgate");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, upstream={}, data_dir={}",
        config.server_port, config.upstream_origin, config.data_dir
    );

    // Open the persistent store
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("creating data directory {}", config.data_dir))?;
    let db = CacheDb::open(config.db_path())
        .await
        .context("opening cache database")?;
    info!("Persistent store ready at {}", config.db_path().display());

    // Construct the resolvers and the gateway
    let upstream = Arc::new(HttpUpstream::new(&config.upstream_origin));
    let images = AssetResolver::new(
        AssetKind::Image,
        db.clone(),
        Arc::new(HttpAssetLookup::new(format!("{}/image", config.asset_api_base))),
    );
    let videos = AssetResolver::new(
        AssetKind::Video,
        db.clone(),
        Arc::new(HttpAssetLookup::new(format!("{}/video", config.asset_api_base))),
    );
    let gateway = Gateway::new(&config, db.clone(), upstream).context("building gateway")?;

    // Install and activate before accepting traffic
    gateway.bootstrap().await.context("bootstrapping gateway")?;

    // Start background expiry sweep
    let sweep_handle = spawn_sweep_task(
        db,
        Duration::from_secs(config.sweep_delay_secs),
        Duration::from_secs(config.sweep_interval_secs),
    );
    info!("Background expiry sweep started");

    // Create router with all endpoints
    let state = AppState::new(images, videos, gateway);
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Gateway listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("serving")?;

    info!("Gateway shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
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

    // Abort the sweep task
    sweep_handle.abort();
    warn!("Expiry sweep task aborted");
}
