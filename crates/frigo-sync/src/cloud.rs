//! # Cloud Slots
//!
//! Transport for the shared snapshot slot addressed by a linking code.
//!
//! ```text
//! ┌────────────────────┐        ┌──────────────────────────────┐
//! │ ReplicationService │──────► │ dyn CloudSlot                │
//! └────────────────────┘        │  ├── HttpCloudSlot (reqwest) │──► SlotServer
//! │                             │  └── MemoryCloudSlot (tests) │
//! │                             └──────────────────────────────┘
//! ```
//!
//! A slot holds at most one snapshot. `write` always overwrites it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::error::{SyncError, SyncResult, Unavailable};
use crate::protocol::CloudSnapshot;

/// Storage key prefix for a slot.
pub const SLOT_KEY_PREFIX: &str = "frigogest_cloud_";

/// Storage key of the slot for `code`.
pub fn slot_key(code: &str) -> String {
    format!("{}{}", SLOT_KEY_PREFIX, code)
}

/// A place where linked devices meet.
#[async_trait]
pub trait CloudSlot: Send + Sync {
    /// Connectivity check. `Ok(())` means the cloud is reachable.
    async fn probe(&self) -> SyncResult<()>;

    /// Current snapshot in the slot, if any.
    async fn read(&self, code: &str) -> SyncResult<Option<CloudSnapshot>>;

    /// Replaces the slot's snapshot.
    async fn write(&self, code: &str, snapshot: &CloudSnapshot) -> SyncResult<()>;
}

// =============================================================================
// In-memory Slots
// =============================================================================

/// Slots kept in process memory.
///
/// Clones share the same slots, so several replication services can play
/// different devices against one cloud. `set_online(false)` makes every
/// call fail the way an unreachable network would.
#[derive(Debug, Clone)]
pub struct MemoryCloudSlot {
    slots: Arc<RwLock<HashMap<String, CloudSnapshot>>>,
    online: Arc<AtomicBool>,
}

impl Default for MemoryCloudSlot {
    fn default() -> Self {
        MemoryCloudSlot {
            slots: Arc::new(RwLock::new(HashMap::new())),
            online: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl MemoryCloudSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn check_online(&self) -> SyncResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::SyncUnavailable(Unavailable::Offline))
        }
    }
}

#[async_trait]
impl CloudSlot for MemoryCloudSlot {
    async fn probe(&self) -> SyncResult<()> {
        self.check_online()
    }

    async fn read(&self, code: &str) -> SyncResult<Option<CloudSnapshot>> {
        self.check_online()?;
        Ok(self.slots.read().await.get(&slot_key(code)).cloned())
    }

    async fn write(&self, code: &str, snapshot: &CloudSnapshot) -> SyncResult<()> {
        self.check_online()?;
        self.slots
            .write()
            .await
            .insert(slot_key(code), snapshot.clone());
        Ok(())
    }
}

// =============================================================================
// HTTP Slots
// =============================================================================

/// Slots served by a [`crate::hub::SlotServer`] over HTTP.
///
/// ```text
/// probe  ──► GET {base}/health
/// read   ──► GET {base}/slots/{code}      200 snapshot │ 404 empty
/// write  ──► PUT {base}/slots/{code}      204
/// ```
#[derive(Debug, Clone)]
pub struct HttpCloudSlot {
    base: Url,
    client: Client,
}

impl HttpCloudSlot {
    /// Creates a client for the slot server at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> SyncResult<Self> {
        let mut base = Url::parse(base_url)?;
        // Url::join drops the last path segment unless it ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(HttpCloudSlot { base, client })
    }

    fn slot_url(&self, code: &str) -> SyncResult<Url> {
        Ok(self.base.join(&format!("slots/{}", code))?)
    }
}

/// Turns a non-success response into `RemoteRejected`.
async fn rejected(response: reqwest::Response) -> SyncError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    SyncError::RemoteRejected { status, message }
}

#[async_trait]
impl CloudSlot for HttpCloudSlot {
    async fn probe(&self) -> SyncResult<()> {
        let url = self.base.join("health")?;
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                debug!(status = %response.status(), "Cloud health check failed");
                Err(SyncError::SyncUnavailable(Unavailable::Offline))
            }
            Err(e) => {
                debug!(error = %e, "Cloud unreachable");
                Err(SyncError::SyncUnavailable(Unavailable::Offline))
            }
        }
    }

    async fn read(&self, code: &str) -> SyncResult<Option<CloudSnapshot>> {
        let response = self.client.get(self.slot_url(code)?).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(rejected(response).await),
        }
    }

    async fn write(&self, code: &str, snapshot: &CloudSnapshot) -> SyncResult<()> {
        let response = self
            .client
            .put(self.slot_url(code)?)
            .json(snapshot)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejected(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frigo_core::Dataset;

    #[tokio::test]
    async fn test_memory_slot_overwrites() {
        let cloud = MemoryCloudSlot::new();
        assert!(cloud.read("AB12").await.unwrap().is_none());

        let first = CloudSnapshot {
            timestamp: 10,
            device_id: "a".into(),
            payload: Dataset::default(),
        };
        let older = CloudSnapshot {
            timestamp: 5,
            device_id: "b".into(),
            payload: Dataset::default(),
        };
        cloud.write("AB12", &first).await.unwrap();
        cloud.write("AB12", &older).await.unwrap();

        // Last writer wins, regardless of timestamps
        assert_eq!(cloud.read("AB12").await.unwrap().unwrap().device_id, "b");
        assert!(cloud.read("ZZ99").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_slot_offline() {
        let cloud = MemoryCloudSlot::new();
        let shared = cloud.clone();
        shared.set_online(false);

        assert!(cloud.probe().await.unwrap_err().is_unavailable());
        assert!(cloud.read("AB12").await.is_err());
    }

    #[test]
    fn test_slot_urls_keep_base_path() {
        let slot = HttpCloudSlot::new("http://10.0.0.5:8787/frigo", Duration::from_secs(1)).unwrap();
        assert_eq!(
            slot.slot_url("AB12CD").unwrap().as_str(),
            "http://10.0.0.5:8787/frigo/slots/AB12CD"
        );
        assert_eq!(slot_key("AB12CD"), "frigogest_cloud_AB12CD");
    }
}
