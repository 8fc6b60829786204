//! # Replication Service
//!
//! Push and pull of whole-dataset snapshots through a cloud slot.
//!
//! ## Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        pull() then push()                               │
//! │                                                                         │
//! │  ready? ── mode offline ─────────► SyncUnavailable(Disabled)           │
//! │    │  └── no linking code ───────► SyncUnavailable(NotLinked)          │
//! │    │  └── probe fails ───────────► SyncUnavailable(Offline)            │
//! │    ▼                                                                    │
//! │  PULL  read slot ── empty ───────► Ok(false)                           │
//! │          │                                                              │
//! │          ▼                                                              │
//! │        timestamp > watermark? ── no ──► Ok(false)                      │
//! │          │ yes                                                          │
//! │          ▼                                                              │
//! │        overwrite products, batches, customers, sales, saleDetails      │
//! │        watermark = timestamp          (one transaction) ──► Ok(true)   │
//! │                                                                         │
//! │  PUSH  snapshot all six collections, stamp now, write slot             │
//! │        watermark = max(watermark, stamp)                 ──► Ok(stamp) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Last Writer Wins
//! The slot is overwritten on every push. Two devices that both write
//! between cycles lose whichever push lands first, unless that device
//! pulls and then re-pushes its own work. Running pull before push in the
//! agent is that re-push sequence; nothing here merges records.

use frigo_core::validation::{normalize_linking_code, LINKING_CODE_MAX_LEN};
use frigo_db::Database;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cloud::CloudSlot;
use crate::config::SyncMode;
use crate::error::{SyncError, SyncResult, Unavailable};
use crate::protocol::CloudSnapshot;

const LINKING_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A fresh 6-character linking code.
pub fn generate_linking_code() -> String {
    let mut rng = rand::thread_rng();
    (0..LINKING_CODE_MAX_LEN)
        .map(|_| LINKING_CODE_ALPHABET[rng.gen_range(0..LINKING_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Replicates one device's store through a cloud slot.
#[derive(Clone)]
pub struct ReplicationService {
    db: Database,
    cloud: Arc<dyn CloudSlot>,
    mode: SyncMode,
    device_id: Option<String>,
}

impl ReplicationService {
    pub fn new(db: Database, cloud: Arc<dyn CloudSlot>) -> Self {
        ReplicationService {
            db,
            cloud,
            mode: SyncMode::Auto,
            device_id: None,
        }
    }

    /// Sets the sync mode. `Offline` turns push and pull into no-ops.
    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the device id carried in pushed snapshots.
    pub fn with_device_id(mut self, device_id: Option<String>) -> Self {
        self.device_id = device_id;
        self
    }

    // =========================================================================
    // Linking
    // =========================================================================

    /// Links this device to `code`. Returns the normalized code.
    pub async fn link(&self, code: &str) -> SyncResult<String> {
        let code = normalize_linking_code(code)?;
        self.db.settings().set_linked_id(&code).await?;
        Ok(code)
    }

    /// Returns to standalone mode.
    pub async fn unlink(&self) -> SyncResult<()> {
        self.db.settings().clear_linked_id().await?;
        Ok(())
    }

    pub async fn linked_code(&self) -> SyncResult<Option<String>> {
        Ok(self.db.settings().linked_id().await?)
    }

    /// The device id pushed snapshots carry.
    pub async fn device_id(&self) -> SyncResult<String> {
        match &self.device_id {
            Some(id) => Ok(id.clone()),
            None => Ok(self.db.settings().device_id().await?),
        }
    }

    /// Linked, enabled and online. Returns the linking code.
    async fn ready(&self) -> SyncResult<String> {
        if !self.mode.is_sync_enabled() {
            return Err(SyncError::SyncUnavailable(Unavailable::Disabled));
        }
        let code = self
            .linked_code()
            .await?
            .ok_or(SyncError::SyncUnavailable(Unavailable::NotLinked))?;
        self.cloud.probe().await?;
        Ok(code)
    }

    // =========================================================================
    // Replication
    // =========================================================================

    /// Applies the slot's snapshot if it is newer than the watermark.
    /// Returns whether local data changed.
    pub async fn pull(&self) -> SyncResult<bool> {
        let code = self.ready().await?;

        let Some(snapshot) = self.cloud.read(&code).await? else {
            debug!(code = %code, "Cloud slot is empty");
            return Ok(false);
        };

        let applied = self
            .db
            .collections()
            .apply_snapshot(&snapshot.payload, snapshot.timestamp)
            .await?;

        if applied {
            info!(
                code = %code,
                timestamp = snapshot.timestamp,
                from_device = %snapshot.device_id,
                "Pulled newer snapshot"
            );
        }
        Ok(applied)
    }

    /// Publishes the whole local dataset to the slot, unconditionally.
    /// Returns the snapshot timestamp.
    pub async fn push(&self) -> SyncResult<i64> {
        let code = self.ready().await?;

        let data = self.db.collections().all_data().await?;
        let records = data.record_count();
        let snapshot = CloudSnapshot::capture(data, self.device_id().await?);

        self.cloud.write(&code, &snapshot).await?;
        self.db
            .settings()
            .advance_last_sync_ts(snapshot.timestamp)
            .await?;

        info!(code = %code, timestamp = snapshot.timestamp, records, "Pushed snapshot");
        Ok(snapshot.timestamp)
    }
}

impl std::fmt::Debug for ReplicationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationService")
            .field("mode", &self.mode)
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::MemoryCloudSlot;
    use frigo_core::sales::SaleDraft;
    use frigo_core::PaymentMethod;
    use frigo_db::DbConfig;

    async fn device(cloud: &MemoryCloudSlot, name: &str) -> ReplicationService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.collections().init().await.unwrap();
        ReplicationService::new(db, Arc::new(cloud.clone()))
            .with_device_id(Some(name.to_string()))
    }

    async fn sale_count(service: &ReplicationService) -> usize {
        service.db.sales().list_sales(None, None).await.unwrap().len()
    }

    async fn sell(service: &ReplicationService, customer: &str) {
        let draft = SaleDraft::new(customer, "admin", PaymentMethod::Cash).line("p2", 1);
        service.db.sales().create_from_draft(&draft).await.unwrap();
    }

    #[test]
    fn test_generated_codes_are_valid() {
        for _ in 0..50 {
            let code = generate_linking_code();
            assert_eq!(code.len(), 6);
            assert_eq!(normalize_linking_code(&code).unwrap(), code);
        }
    }

    #[tokio::test]
    async fn test_unlinked_is_unavailable() {
        let cloud = MemoryCloudSlot::new();
        let a = device(&cloud, "a").await;

        let err = a.push().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::SyncUnavailable(Unavailable::NotLinked)
        ));
        assert!(a.pull().await.unwrap_err().is_unavailable());
    }

    #[tokio::test]
    async fn test_link_normalizes_and_rejects() {
        let cloud = MemoryCloudSlot::new();
        let a = device(&cloud, "a").await;

        assert_eq!(a.link(" ab12cd ").await.unwrap(), "AB12CD");
        assert_eq!(a.linked_code().await.unwrap().as_deref(), Some("AB12CD"));
        assert!(matches!(
            a.link("A-1").await,
            Err(SyncError::InvalidLinkingCode(_))
        ));

        a.unlink().await.unwrap();
        assert!(a.linked_code().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offline_and_disabled_are_noops() {
        let cloud = MemoryCloudSlot::new();
        let a = device(&cloud, "a").await;
        a.link("AB12").await.unwrap();

        cloud.set_online(false);
        assert!(matches!(
            a.push().await,
            Err(SyncError::SyncUnavailable(Unavailable::Offline))
        ));
        cloud.set_online(true);

        let disabled = a.clone().with_mode(SyncMode::Offline);
        assert!(matches!(
            disabled.pull().await,
            Err(SyncError::SyncUnavailable(Unavailable::Disabled))
        ));
    }

    #[tokio::test]
    async fn test_pull_from_empty_slot() {
        let cloud = MemoryCloudSlot::new();
        let a = device(&cloud, "a").await;
        a.link("AB12").await.unwrap();
        assert!(!a.pull().await.unwrap());
    }

    #[tokio::test]
    async fn test_push_then_pull_on_second_device() {
        let cloud = MemoryCloudSlot::new();
        let a = device(&cloud, "a").await;
        let b = device(&cloud, "b").await;
        a.link("AB12").await.unwrap();
        b.link("AB12").await.unwrap();

        sell(&a, "c2").await;
        let ts = a.push().await.unwrap();

        assert!(b.pull().await.unwrap());
        assert_eq!(sale_count(&b).await, 1);
        assert_eq!(b.db.settings().last_sync_ts().await.unwrap(), ts);

        // Same snapshot again is not newer
        assert!(!b.pull().await.unwrap());
    }

    #[tokio::test]
    async fn test_own_push_is_not_reapplied() {
        let cloud = MemoryCloudSlot::new();
        let a = device(&cloud, "a").await;
        a.link("AB12").await.unwrap();

        a.push().await.unwrap();
        sell(&a, "c2").await;

        assert!(!a.pull().await.unwrap());
        assert_eq!(sale_count(&a).await, 1);
    }

    #[tokio::test]
    async fn test_pull_keeps_local_categories() {
        let cloud = MemoryCloudSlot::new();
        let a = device(&cloud, "a").await;
        let b = device(&cloud, "b").await;
        a.link("AB12").await.unwrap();
        b.link("AB12").await.unwrap();

        a.db.inventory().add_category("Helados", "").await.unwrap();
        a.push().await.unwrap();
        b.pull().await.unwrap();

        assert_eq!(a.db.inventory().categories().await.unwrap().len(), 4);
        assert_eq!(b.db.inventory().categories().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_last_writer_wins_until_repush() {
        let cloud = MemoryCloudSlot::new();
        let a = device(&cloud, "a").await;
        let b = device(&cloud, "b").await;
        a.link("AB12").await.unwrap();
        b.link("AB12").await.unwrap();

        sell(&a, "c1").await;
        sell(&b, "c2").await;

        a.push().await.unwrap();
        // Ensure b's stamp is strictly later
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        b.push().await.unwrap();

        // b pushed last: the slot only has b's sale
        assert!(a.pull().await.unwrap());
        assert_eq!(sale_count(&a).await, 1);
        let sales = a.db.sales().list_sales(None, None).await.unwrap();
        assert_eq!(sales[0].customer_id, "c2");
    }
}
