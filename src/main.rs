use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

mod backends;
mod config;
mod logging;
mod proxy;
mod server;
mod types;

use config::load_config;
use proxy::UpstreamClient;
use server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = load_config()?;

    // Initialize tracing; the guard flushes the log file on exit
    let _log_guard = logging::init_tracing(&config.logging)?;
    tracing::info!(
        debug = config.server.debug,
        log_level = %config.logging.level,
        "Configuration loaded"
    );

    if config.upstream.username.is_empty() {
        tracing::warn!("USERNAME_SAWERIA is not set; fee calculation will hit an invalid path");
    }
    if config.upstream.donation_id.is_empty() {
        tracing::warn!("DONATION_ID is not set; QRIS requests must pass ?donation_id=");
    }

    let config = Arc::new(config);

    // One pooled client and concurrency gate for the whole process
    let upstream = Arc::new(UpstreamClient::new(
        Arc::new(config.upstream.clone()),
        Arc::new(config.logging.clone()),
    )?);

    let app = build_router(AppState {
        upstream: upstream.clone(),
        config: config.clone(),
    });

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    drop(upstream);
    tracing::info!("Application shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, draining in-flight requests"),
        () = terminate => tracing::info!("Received SIGTERM, draining in-flight requests"),
    }
}
