//! # Sync Configuration
//!
//! Configuration for replication, plus the listen settings the slot server
//! fills from its own environment.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FRIGO_SYNC_MODE=offline                                            │
//! │     FRIGO_CLOUD_URL=http://10.0.0.5:8787                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/frigogest/sync.toml (Linux)                              │
//! │     ~/Library/Application Support/co.frigogest.FrigoGest/sync.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     SyncMode::Auto, 15 s interval, slot server on 127.0.0.1:8787       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The linking code and the watermark are not configuration: they live in
//! the store's device settings.
//!
//! ## Configuration File Format
//! ```toml
//! [device]
//! name = "Camion 2"
//!
//! [sync]
//! mode = "auto"  # auto | offline
//! cloud_url = "http://127.0.0.1:8787"
//! interval_secs = 15
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Sync Mode
// =============================================================================

/// Whether this device replicates at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Replicate whenever linked and online.
    #[default]
    Auto,

    /// Never replicate; local operations only.
    Offline,
}

impl SyncMode {
    /// Returns true if sync is enabled at all.
    pub fn is_sync_enabled(&self) -> bool {
        !matches!(self, SyncMode::Offline)
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::Auto => write!(f, "auto"),
            SyncMode::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for SyncMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" | "online" => Ok(SyncMode::Auto),
            "offline" | "disabled" => Ok(SyncMode::Offline),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown sync mode: '{}'. Valid options: auto, offline",
                other
            ))),
        }
    }
}

// =============================================================================
// Device Configuration
// =============================================================================

/// Configuration for this device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device id carried in pushed snapshots.
    ///
    /// When unset, the id generated once and kept in the store is used.
    #[serde(default)]
    pub id: Option<String>,

    /// Human-readable device name, for logs.
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "FrigoGest Device".to_string()
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Replication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub mode: SyncMode,

    /// Base URL of the slot server acting as the shared cloud.
    #[serde(default = "default_cloud_url")]
    pub cloud_url: String,

    /// Seconds between pull-then-push cycles.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Per-request timeout against the cloud (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_cloud_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_interval() -> u64 {
    15
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            mode: SyncMode::default(),
            cloud_url: default_cloud_url(),
            interval_secs: default_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Server Settings
// =============================================================================

/// Where the slot server listens. Not part of `sync.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let url = url::Url::parse(&self.sync.cloud_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidUrl(format!(
                "Cloud URL must start with http:// or https://, got: {}",
                self.sync.cloud_url
            )));
        }

        if self.sync.interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "interval_secs must be greater than 0".into(),
            ));
        }

        if self.sync.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(id) = &self.device.id {
            if id.trim().is_empty() {
                return Err(SyncError::InvalidConfig("device id must not be blank".into()));
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("FRIGO_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = Some(id);
        }

        if let Ok(name) = std::env::var("FRIGO_DEVICE_NAME") {
            self.device.name = name;
        }

        if let Ok(mode) = std::env::var("FRIGO_SYNC_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding sync mode from environment");
                    self.sync.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown sync mode in environment"),
            }
        }

        if let Ok(url) = std::env::var("FRIGO_CLOUD_URL") {
            debug!(url = %url, "Overriding cloud URL from environment");
            self.sync.cloud_url = url;
        }

        if let Ok(secs) = std::env::var("FRIGO_SYNC_INTERVAL_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                self.sync.interval_secs = s;
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("co", "frigogest", "FrigoGest")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn mode(&self) -> SyncMode {
        self.sync.mode
    }

    pub fn is_sync_enabled(&self) -> bool {
        self.sync.mode.is_sync_enabled()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.request_timeout_secs)
    }
}
