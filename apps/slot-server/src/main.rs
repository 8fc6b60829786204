//! # FrigoGest Slot Server
//!
//! Serves the shared cloud slots linked devices push to and pull from.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Slot Server                                      │
//! │                                                                         │
//! │  Device ───► HTTP (8787) ───► /slots/{code} ───► in-memory slots       │
//! │                                                                         │
//! │  Snapshots live in memory. A restart empties every slot until the      │
//! │  next push from each linked group.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;

use frigo_sync::SlotServer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::SlotServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,frigo=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting FrigoGest slot server...");

    let config = SlotServerConfig::load()?;
    info!(bind = %config.bind_addr, port = config.port, "Configuration loaded");

    let handle = SlotServer::new(config.server_settings()).start().await?;
    info!(url = %handle.url(), "Slot server ready");

    shutdown_signal().await;

    let slots = handle.slot_count().await;
    handle.shutdown().await?;
    info!(slots, "Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
