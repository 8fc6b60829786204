//! Slot server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use frigo_sync::ServerSettings;
use std::env;

/// Slot server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotServerConfig {
    /// Bind address (`FRIGO_SLOT_BIND`, default 0.0.0.0)
    pub bind_addr: String,

    /// HTTP port (`FRIGO_SLOT_PORT`, default 8787)
    pub port: u16,
}

impl SlotServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerSettings::default();

        let bind_addr = lookup("FRIGO_SLOT_BIND").unwrap_or(defaults.bind_addr);
        if bind_addr.trim().is_empty() {
            return Err(ConfigError::InvalidValue("FRIGO_SLOT_BIND".to_string()));
        }

        let port = match lookup("FRIGO_SLOT_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("FRIGO_SLOT_PORT".to_string()))?,
            None => defaults.port,
        };

        Ok(SlotServerConfig { bind_addr, port })
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            bind_addr: self.bind_addr.clone(),
            port: self.port,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
