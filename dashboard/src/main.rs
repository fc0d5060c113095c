mod api;
mod bootstrap;
mod bridge;
mod config;
mod loader;
mod session;
mod source;
mod view;

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use anyhow::{Context, Result};
use crate::config::Config;
use crate::loader::assets::AssetStore;
use crate::session::SessionHandle;
use crate::source::HttpListSource;
use crate::view::digest::Fragment;
use crate::view::filter::FilterState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dashboard=info"))
        )
        .init();

    tracing::info!("Starting server list dashboard");

    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/server-list-dashboard/dashboard.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    tracing::info!("Loaded config from {}", config_path);

    let list_url = config.dashboard.list_url();
    let source = HttpListSource::new(list_url.as_str())
        .context("Failed to create list client")?;
    tracing::info!("Polling {}", list_url);

    // The mount: whatever was rendered last
    let (mount_tx, mount_rx) = watch::channel(Fragment::empty());

    let filter = FilterState {
        proto_range: config.filter.proto_range,
        min_clients: config.filter.min_clients,
        limit: config.filter.limit,
    };
    let session = SessionHandle::spawn(Arc::new(source), filter, mount_tx);

    let assets = AssetStore::new()?;

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Spawn bootstrap task: load page dependencies, then start polling
    let boot_assets = assets.clone();
    let boot_session = session.clone();
    let boot_config = config.clone();
    let boot_cancel = cancel.clone();
    let boot_handle = tokio::spawn(async move {
        let probe = boot_assets.clone();
        let library = boot_config.bootstrap.ui_library.name.clone();
        let bootstrapped = bootstrap::run(
            Arc::new(boot_assets),
            &boot_config.dashboard.root,
            &boot_config.bootstrap,
            Arc::new(move || probe.has_script(&library)),
        );

        tokio::select! {
            _ = bootstrapped => {}
            _ = boot_cancel.cancelled() => return None,
        }

        match boot_session
            .loaded(
                boot_config.dashboard.no_refresh,
                boot_config.dashboard.refresh_interval(),
                boot_cancel,
            )
            .await
        {
            Ok(refresh) => refresh,
            Err(e) => {
                tracing::error!("Failed to start list polling: {}", e);
                None
            }
        }
    });

    // Build API router
    let app_state = api::routes::AppState {
        session: session.clone(),
        mount: mount_rx,
        assets: assets.clone(),
        proto_ranges: Arc::new(config.filter.proto_ranges.clone()),
    };
    let app = api::routes::router(app_state);

    // Bind HTTP server
    let listener = tokio::net::TcpListener::bind(&config.api.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.api.listen))?;

    tracing::info!("Dashboard listening on {}", config.api.listen);

    // The page exists now; the loader may install assets into it
    assets.attach();

    // Run server with graceful shutdown
    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutdown signal received");

    // Trigger cancellation
    cancel.cancel();

    // Wait for the bootstrap task, then the refresh loop it started
    match boot_handle.await {
        Ok(Some(refresh)) => {
            let _ = refresh.await;
        }
        Ok(None) => {}
        Err(e) => tracing::error!("Bootstrap task failed: {}", e),
    }
    let _ = server_handle.await;

    // Shutdown session task
    if let Err(e) = session.shutdown().await {
        tracing::error!("Failed to shutdown session: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
