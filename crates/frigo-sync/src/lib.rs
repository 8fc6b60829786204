//! # frigo-sync: Replication Service for FrigoGest
//!
//! Devices that share a linking code converge on one dataset by pushing
//! and pulling whole snapshots through a shared cloud slot.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Replication Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  SyncAgent (every interval_secs)                 │  │
//! │  │                                                                  │  │
//! │  │  pull() then push(), status + refresh events, sync_now           │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      ReplicationService                          │  │
//! │  │                                                                  │  │
//! │  │  link / unlink ──► device settings (frigo-db)                    │  │
//! │  │  pull ──► watermark-gated apply_snapshot (5 collections)         │  │
//! │  │  push ──► all_data, stamp, write slot, advance watermark         │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               ▼                                         │
//! │         ┌──────────────────────────────────────────────┐               │
//! │         │  dyn CloudSlot                               │               │
//! │         │   ├── HttpCloudSlot ──► SlotServer (axum)    │               │
//! │         │   └── MemoryCloudSlot                        │               │
//! │         └──────────────────────────────────────────────┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`agent`] - Periodic `SyncAgent` and its handle
//! - [`cloud`] - `CloudSlot` transport trait and implementations
//! - [`config`] - Sync configuration (mode, device, cloud URL, server)
//! - [`error`] - Sync error types
//! - [`hub`] - HTTP slot server
//! - [`protocol`] - Snapshot wire format
//! - [`replication`] - Push, pull and linking
//!
//! ## Usage
//!
//! ```rust,ignore
//! use frigo_sync::{HttpCloudSlot, ReplicationService, SyncAgent, SyncConfig};
//! use std::sync::Arc;
//!
//! let config = SyncConfig::load(None)?;
//! let cloud = HttpCloudSlot::new(&config.sync.cloud_url, config.request_timeout())?;
//! let service = ReplicationService::new(database, Arc::new(cloud));
//!
//! service.link("AB12CD").await?;
//! let handle = SyncAgent::new(config, service).start();
//!
//! let status = handle.status().await;
//! println!("State: {}", status.state);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod cloud;
pub mod config;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod replication;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::{
    CycleOutcome, LogEmitter, NoOpEmitter, SyncAgent, SyncAgentBuilder, SyncAgentHandle,
    SyncEventEmitter, SyncState, SyncStatus,
};
pub use cloud::{CloudSlot, HttpCloudSlot, MemoryCloudSlot};
pub use config::{DeviceConfig, ServerSettings, SyncConfig, SyncMode, SyncSettings};
pub use error::{SyncError, SyncResult, Unavailable};
pub use hub::{SlotServer, SlotServerHandle, SlotState};
pub use protocol::CloudSnapshot;
pub use replication::{generate_linking_code, ReplicationService};
