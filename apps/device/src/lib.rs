//! # FrigoGest Device Library
//!
//! Opens the local store, wires the sync agent and the text generator, and
//! runs the requested command.
//!
//! ## Module Organization
//! ```text
//! frigo_device/
//! ├── lib.rs          ◄─── You are here (startup & daemon loop)
//! ├── cli.rs          ◄─── Argument parsing
//! ├── commands.rs     ◄─── One-shot commands
//! └── error.rs        ◄─── AppError and exit codes
//! ```

pub mod cli;
pub mod commands;
pub mod error;

use directories::ProjectDirs;
use frigo_db::{Database, DbConfig};
use frigo_insights::{InsightService, InsightsConfig};
use frigo_sync::{HttpCloudSlot, SyncConfig, SyncState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use commands::Device;
use error::{AppError, AppResult};

/// Runs one invocation.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Device Startup                                    │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter (RUST_LOG)                     │
/// │                                                                         │
/// │  2. Load Sync Config ─────────────────────────────────────────────────► │
/// │     • sync.toml, then FRIGO_* environment overrides                     │
/// │                                                                         │
/// │  3. Open Store ───────────────────────────────────────────────────────► │
/// │     • FRIGO_DB_PATH or the platform data dir                            │
/// │     • Run migrations, seed missing collections                          │
/// │                                                                         │
/// │  4. Wire Collaborators ───────────────────────────────────────────────► │
/// │     • HTTP cloud slot, replication service, insight service             │
/// │                                                                         │
/// │  5. Dispatch ─────────────────────────────────────────────────────────► │
/// │     • run: sync agent until Ctrl+C                                      │
/// │     • anything else: one-shot command                                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> AppResult<()> {
    let config = SyncConfig::load(cli.config_path.clone())?;
    let db_path = match cli.db_path.clone() {
        Some(path) => path,
        None => get_database_path()?,
    };
    let device = open_device(&db_path, config).await?;

    let result = match cli.command {
        Command::Run => run_daemon(&device).await,
        command => {
            let mut stdout = std::io::stdout();
            commands::execute(&device, command, &mut stdout).await
        }
    };

    device.db.close().await;
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=frigo=trace` - Show trace for frigo crates only
/// - Default: INFO, DEBUG for frigo crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,frigo=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_device(db_path: &Path, config: SyncConfig) -> AppResult<Device> {
    info!(?db_path, "Opening store");
    let db = Database::new(DbConfig::new(db_path)).await?;

    let seeded = db.collections().init().await?;
    if !seeded.is_empty() {
        info!(collections = seeded.len(), "Seeded missing collections");
    }

    let cloud = HttpCloudSlot::new(&config.sync.cloud_url, config.request_timeout())?;
    let insights = InsightService::from_config(&InsightsConfig::from_env());

    Ok(Device::new(db, config, Arc::new(cloud), insights))
}

/// Keeps the device in sync until Ctrl+C or SIGTERM.
async fn run_daemon(device: &Device) -> AppResult<()> {
    match device.replication.linked_code().await? {
        Some(code) => info!(code = %code, "Device linked"),
        None => info!("Device not linked; cycles are skipped until `frigogest link`"),
    }

    let handle = device.agent().start();

    shutdown_signal().await;

    let status = handle.status().await;
    if status.state == SyncState::Offline {
        warn!("Shutting down while offline; local changes publish on next start");
    }
    handle.shutdown().await;
    info!(cycles = status.cycles, "Device stopped");
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

/// Determines the database file path based on the platform.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/co.frigogest.FrigoGest/frigogest.db`
/// - **Windows**: `%APPDATA%\frigogest\FrigoGest\data\frigogest.db`
/// - **Linux**: `~/.local/share/frigogest/frigogest.db`
///
/// ## Override
/// Set `FRIGO_DB_PATH` to use a custom path.
fn get_database_path() -> AppResult<PathBuf> {
    if let Ok(path) = std::env::var("FRIGO_DB_PATH") {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("co", "frigogest", "FrigoGest").ok_or(AppError::NoDataDir)?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("frigogest.db"))
}
