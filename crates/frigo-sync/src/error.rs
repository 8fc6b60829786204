//! # Sync Error Types
//!
//! Error types for replication.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Data                │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  SyncUnavailable│  │  InvalidLinkingCode     │ │
//! │  │  InvalidUrl     │  │  RemoteUnreach. │  │  InvalidSnapshot        │ │
//! │  │  ConfigLoad/Save│  │  RemoteRejected │  │  Store                  │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these reach the user as a blocking error: the agent logs them,
//! records them in its status, and tries again on the next cycle.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Why replication is not possible right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// No linking code stored: standalone mode.
    NotLinked,
    /// The cloud did not answer the connectivity probe.
    Offline,
    /// Sync mode is `offline` in the configuration.
    Disabled,
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unavailable::NotLinked => write!(f, "device is not linked"),
            Unavailable::Offline => write!(f, "cloud is unreachable"),
            Unavailable::Disabled => write!(f, "sync is disabled"),
        }
    }
}

/// Sync error type covering all replication failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid cloud URL.
    #[error("Invalid cloud URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Offline, unlinked or disabled.
    #[error("Sync unavailable: {0}")]
    SyncUnavailable(Unavailable),

    /// Network failure talking to the cloud slot.
    #[error("Remote unreachable: {0}")]
    RemoteUnreachable(String),

    /// The cloud answered with an unexpected status.
    #[error("Remote rejected request with status {status}: {message}")]
    RemoteRejected { status: u16, message: String },

    /// The slot server could not bind or serve.
    #[error("Server error: {0}")]
    ServerError(String),

    // =========================================================================
    // Data Errors
    // =========================================================================
    /// Linking code does not follow the 4-6 alphanumeric rule.
    #[error("Invalid linking code: {0}")]
    InvalidLinkingCode(String),

    /// A snapshot could not be encoded or decoded.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// The local store failed.
    #[error("Store error: {0}")]
    Store(#[from] frigo_db::DbError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Agent is shutting down.
    #[error("Sync agent is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::InvalidSnapshot(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::InvalidSnapshot(err.to_string())
        } else {
            SyncError::RemoteUnreachable(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<frigo_core::ValidationError> for SyncError {
    fn from(err: frigo_core::ValidationError) -> Self {
        SyncError::InvalidLinkingCode(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the next cycle may succeed without any change on
    /// this device.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteUnreachable(_)
                | SyncError::SyncUnavailable(Unavailable::Offline)
                | SyncError::RemoteRejected { status: 500..=599, .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
        )
    }

    /// Returns true for the offline/unlinked/disabled no-op case.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SyncError::SyncUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::RemoteUnreachable("reset".into()).is_retryable());
        assert!(SyncError::SyncUnavailable(Unavailable::Offline).is_retryable());
        assert!(SyncError::RemoteRejected {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());

        assert!(!SyncError::SyncUnavailable(Unavailable::NotLinked).is_retryable());
        assert!(!SyncError::RemoteRejected {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::SyncUnavailable(Unavailable::NotLinked);
        assert_eq!(err.to_string(), "Sync unavailable: device is not linked");
        assert!(err.is_unavailable());
    }
}
