//! # Settings Repository
//!
//! Device-local key/value settings. These never leave the device.
//!
//! | Key                       | Meaning                                   |
//! |---------------------------|-------------------------------------------|
//! | `frigogest_linked_id`     | Linking code of the shared cloud slot     |
//! | `frigogest_last_sync_ts`  | Watermark: newest snapshot applied (ms)   |
//! | `frigogest_device_id`     | Generated once, tags pushed snapshots     |

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

pub const LINKED_ID_KEY: &str = "frigogest_linked_id";
pub const LAST_SYNC_TS_KEY: &str = "frigogest_last_sync_ts";
pub const DEVICE_ID_KEY: &str = "frigogest_device_id";

/// Repository for device settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads a raw setting.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let mut conn = self.pool.acquire().await?;
        read_value(&mut conn, key).await
    }

    /// Writes a raw setting.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        write_value(&mut conn, key, value).await
    }

    /// Removes a setting. Removing a missing key is not an error.
    pub async fn remove(&self, key: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM device_settings WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Linking
    // =========================================================================

    /// The linking code, if this device is linked.
    pub async fn linked_id(&self) -> DbResult<Option<String>> {
        self.get(LINKED_ID_KEY).await
    }

    /// Stores the linking code.
    ///
    /// Switching to a different code also resets the watermark, so the
    /// first pull from the new slot is always applied.
    pub async fn set_linked_id(&self, code: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let previous = read_value(&mut tx, LINKED_ID_KEY).await?;
        write_value(&mut tx, LINKED_ID_KEY, code).await?;
        if previous.as_deref() != Some(code) {
            write_value(&mut tx, LAST_SYNC_TS_KEY, "0").await?;
        }

        tx.commit().await?;
        info!(code, "Device linked");
        Ok(())
    }

    /// Forgets the linking code. The watermark is kept.
    pub async fn clear_linked_id(&self) -> DbResult<()> {
        self.remove(LINKED_ID_KEY).await?;
        info!("Device unlinked");
        Ok(())
    }

    // =========================================================================
    // Watermark
    // =========================================================================

    /// Timestamp (ms) of the newest snapshot applied here. 0 when none.
    pub async fn last_sync_ts(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        read_watermark(&mut conn).await
    }

    /// Overwrites the watermark.
    pub async fn set_last_sync_ts(&self, timestamp: i64) -> DbResult<()> {
        self.set(LAST_SYNC_TS_KEY, &timestamp.to_string()).await
    }

    /// Raises the watermark to `timestamp` unless it is already at or past
    /// it. Returns whether it moved.
    pub async fn advance_last_sync_ts(&self, timestamp: i64) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let current = read_watermark(&mut tx).await?;
        if timestamp <= current {
            return Ok(false);
        }
        write_value(&mut tx, LAST_SYNC_TS_KEY, &timestamp.to_string()).await?;

        tx.commit().await?;
        Ok(true)
    }

    // =========================================================================
    // Device Identity
    // =========================================================================

    /// This device's id, generated and stored on first use.
    pub async fn device_id(&self) -> DbResult<String> {
        if let Some(id) = self.get(DEVICE_ID_KEY).await? {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        // A concurrent first call may have won; keep whichever landed first.
        sqlx::query(
            "INSERT OR IGNORE INTO device_settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
        )
        .bind(DEVICE_ID_KEY)
        .bind(&id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let stored = self.get(DEVICE_ID_KEY).await?;
        Ok(stored.unwrap_or(id))
    }
}

// =============================================================================
// Connection-level Helpers
// =============================================================================

pub(crate) async fn read_value(conn: &mut SqliteConnection, key: &str) -> DbResult<Option<String>> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM device_settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(value)
}

pub(crate) async fn write_value(conn: &mut SqliteConnection, key: &str, value: &str) -> DbResult<()> {
    debug!(key, value, "Writing device setting");

    sqlx::query(
        r#"
        INSERT INTO device_settings (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn read_watermark(conn: &mut SqliteConnection) -> DbResult<i64> {
    match read_value(conn, LAST_SYNC_TS_KEY).await? {
        None => Ok(0),
        Some(raw) => raw.trim().parse().map_err(|_| DbError::InvalidSetting {
            key: LAST_SYNC_TS_KEY.to_string(),
            value: raw,
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn settings() -> SettingsRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().settings()
    }

    #[tokio::test]
    async fn test_raw_get_set_remove() {
        let s = settings().await;
        assert!(s.get("k").await.unwrap().is_none());

        s.set("k", "v1").await.unwrap();
        s.set("k", "v2").await.unwrap();
        assert_eq!(s.get("k").await.unwrap().as_deref(), Some("v2"));

        s.remove("k").await.unwrap();
        s.remove("k").await.unwrap();
        assert!(s.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_watermark_defaults_to_zero() {
        let s = settings().await;
        assert_eq!(s.last_sync_ts().await.unwrap(), 0);

        s.set_last_sync_ts(1_700_000_000_000).await.unwrap();
        assert_eq!(s.last_sync_ts().await.unwrap(), 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_advance_never_moves_back() {
        let s = settings().await;
        assert!(s.advance_last_sync_ts(200).await.unwrap());
        assert!(!s.advance_last_sync_ts(100).await.unwrap());
        assert!(!s.advance_last_sync_ts(200).await.unwrap());
        assert_eq!(s.last_sync_ts().await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_unparseable_watermark_is_an_error() {
        let s = settings().await;
        s.set(LAST_SYNC_TS_KEY, "yesterday").await.unwrap();
        assert!(matches!(
            s.last_sync_ts().await,
            Err(DbError::InvalidSetting { .. })
        ));
    }

    #[tokio::test]
    async fn test_relinking_resets_watermark() {
        let s = settings().await;
        s.set_linked_id("AB12CD").await.unwrap();
        s.set_last_sync_ts(500).await.unwrap();

        // Same code keeps the watermark
        s.set_linked_id("AB12CD").await.unwrap();
        assert_eq!(s.last_sync_ts().await.unwrap(), 500);

        s.set_linked_id("ZZ99").await.unwrap();
        assert_eq!(s.last_sync_ts().await.unwrap(), 0);
        assert_eq!(s.linked_id().await.unwrap().as_deref(), Some("ZZ99"));

        s.clear_linked_id().await.unwrap();
        assert!(s.linked_id().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_device_id_is_stable() {
        let s = settings().await;
        let first = s.device_id().await.unwrap();
        assert_eq!(s.device_id().await.unwrap(), first);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
