//! # Anime Cache Server
//!
//! Loads configuration, wires the system context, starts the retry drain
//! scheduler and serves the HTTP routes until Ctrl-C or SIGTERM.

use anime_cache::config::ConfigManager;
use anime_cache::logging::init_structured_logging;
use anime_cache::retry::RetryScheduler;
use anime_cache::system_context::SystemContext;
use anime_cache::web;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let config_manager = ConfigManager::load().context("failed to load configuration")?;
    let context = Arc::new(
        SystemContext::from_config(config_manager.clone())
            .await
            .context("failed to initialize system context")?,
    );
    let config = config_manager.config();

    let mut scheduler = if config.retry.enabled {
        Some(RetryScheduler::start(
            context.coordinator.clone(),
            config.retry.drain_interval(),
        ))
    } else {
        info!("Retry drain disabled by configuration");
        None
    };

    let listener = tokio::net::TcpListener::bind(&config.web.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.web.bind_address))?;
    info!(
        bind_address = %config.web.bind_address,
        system_id = %context.system_id,
        "🚀 Anime cache server listening"
    );

    axum::serve(listener, web::router(context.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.stop().await;
    }
    context.shutdown().await;

    info!("👋 Anime cache server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
