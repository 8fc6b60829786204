//! # Collection Repository
//!
//! The Persistent Store surface: named collections held as JSON arrays.
//!
//! ## One Transaction per Operation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mutate(&[Batches, SaleDetails, Sales, Customers], |data| ...)         │
//! │                                                                         │
//! │  write_lock ──► BEGIN                                                  │
//! │                   │                                                     │
//! │                   ├── load every collection into a Dataset             │
//! │                   ├── run the engine operation on it                   │
//! │                   │     └── Err? ──► ROLLBACK, nothing written         │
//! │                   ├── write back the touched collections               │
//! │                   ▼                                                     │
//! │                 COMMIT ──► release write_lock                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missing row reads as an empty collection.

use chrono::Utc;
use frigo_core::{seed, Collection, CoreResult, Dataset};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::settings::{self, LAST_SYNC_TS_KEY};

/// Repository for raw collection access.
#[derive(Debug, Clone)]
pub struct CollectionRepository {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl CollectionRepository {
    /// Creates a new CollectionRepository.
    pub fn new(pool: SqlitePool, write_lock: Arc<Mutex<()>>) -> Self {
        CollectionRepository { pool, write_lock }
    }

    // =========================================================================
    // Raw Access
    // =========================================================================

    /// Reads one collection. A missing collection is empty.
    pub async fn get<T: DeserializeOwned>(&self, collection: Collection) -> DbResult<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        match read_raw(&mut conn, collection).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrites one collection.
    pub async fn save<T: Serialize>(&self, collection: Collection, items: &[T]) -> DbResult<()> {
        let json = serde_json::to_string(items)?;
        let _guard = self.write_lock.lock().await;
        let mut conn = self.pool.acquire().await?;
        write_raw(&mut conn, collection, &json).await
    }

    /// Whether a row exists for the collection.
    pub async fn exists(&self, collection: Collection) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Ok(read_raw(&mut conn, collection).await?.is_some())
    }

    /// Loads all six collections into a Dataset.
    pub async fn load_dataset(&self) -> DbResult<Dataset> {
        let mut conn = self.pool.acquire().await?;
        load_dataset(&mut conn).await
    }

    /// Consistent snapshot of all six collections, read under the write
    /// lock so no engine operation is half visible.
    pub async fn all_data(&self) -> DbResult<Dataset> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let data = load_dataset(&mut tx).await?;
        tx.commit().await?;
        Ok(data)
    }

    /// Writes the listed collections of `data` in one transaction.
    pub async fn commit(&self, data: &Dataset, collections: &[Collection]) -> DbResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        write_collections(&mut tx, data, collections).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Runs an engine operation as one load → mutate → commit cycle.
    ///
    /// Only the `touched` collections are written back. When `op` fails the
    /// transaction is dropped and the store is unchanged.
    pub async fn mutate<T, F>(&self, touched: &[Collection], op: F) -> DbResult<T>
    where
        F: FnOnce(&mut Dataset) -> CoreResult<T>,
    {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let mut data = load_dataset(&mut tx).await?;
        let result = op(&mut data)?;

        write_collections(&mut tx, &data, touched).await?;
        tx.commit().await?;
        Ok(result)
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Seeds every missing collection with the defaults. Existing
    /// collections are left alone. Returns the keys that were seeded.
    pub async fn init(&self) -> DbResult<Vec<Collection>> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let defaults = seed::dataset();
        let mut seeded = Vec::new();
        for collection in Collection::ALL {
            if read_raw(&mut tx, collection).await?.is_none() {
                write_raw(&mut tx, collection, &defaults.collection_json(collection)?).await?;
                seeded.push(collection);
            }
        }

        tx.commit().await?;
        if !seeded.is_empty() {
            info!(count = seeded.len(), "Seeded missing collections");
        }
        Ok(seeded)
    }

    /// Resets the store.
    ///
    /// `full` drops every collection and device setting, then re-seeds.
    /// Otherwise only seed products and customers missing by id are added
    /// back. Returns the number of records restored in the partial case,
    /// or the record count of the fresh store after a full reset.
    pub async fn reset(&self, full: bool) -> DbResult<usize> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let count = if full {
            sqlx::query("DELETE FROM collections")
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM device_settings")
                .execute(&mut *tx)
                .await?;

            let defaults = seed::dataset();
            write_collections(&mut tx, &defaults, &Collection::ALL).await?;
            defaults.record_count()
        } else {
            let mut data = load_dataset(&mut tx).await?;
            let added = seed::restore_missing(&mut data);
            write_collections(&mut tx, &data, &[Collection::Products, Collection::Customers])
                .await?;
            added
        };

        tx.commit().await?;
        info!(full, count, "Store reset");
        Ok(count)
    }

    // =========================================================================
    // Replication
    // =========================================================================

    /// Applies a remote snapshot if `timestamp` is newer than the stored
    /// watermark.
    ///
    /// Overwrites the replicated collections (categories excluded) and
    /// advances the watermark in the same transaction. Returns whether the
    /// snapshot was applied.
    pub async fn apply_snapshot(&self, remote: &Dataset, timestamp: i64) -> DbResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let watermark = settings::read_watermark(&mut tx).await?;
        if timestamp <= watermark {
            debug!(timestamp, watermark, "Remote snapshot not newer, skipping");
            return Ok(false);
        }

        write_collections(&mut tx, remote, &Collection::REPLICATED).await?;
        settings::write_value(&mut tx, LAST_SYNC_TS_KEY, &timestamp.to_string()).await?;

        tx.commit().await?;
        info!(timestamp, previous = watermark, "Remote snapshot applied");
        Ok(true)
    }
}

// =============================================================================
// Connection-level Helpers
// =============================================================================

async fn read_raw(conn: &mut SqliteConnection, collection: Collection) -> DbResult<Option<String>> {
    let json: Option<String> = sqlx::query_scalar("SELECT data FROM collections WHERE key = ?1")
        .bind(collection.key())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(json)
}

async fn write_raw(conn: &mut SqliteConnection, collection: Collection, json: &str) -> DbResult<()> {
    debug!(key = %collection, bytes = json.len(), "Writing collection");

    sqlx::query(
        r#"
        INSERT INTO collections (key, data, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(collection.key())
    .bind(json)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn load_dataset(conn: &mut SqliteConnection) -> DbResult<Dataset> {
    let rows = sqlx::query("SELECT key, data FROM collections")
        .fetch_all(&mut *conn)
        .await?;

    let mut data = Dataset::default();
    for row in rows {
        let key: String = row.try_get("key")?;
        let json: String = row.try_get("data")?;
        if let Some(collection) = Collection::from_key(&key) {
            data.load_collection_json(collection, &json)?;
        }
    }
    Ok(data)
}

async fn write_collections(
    conn: &mut SqliteConnection,
    data: &Dataset,
    collections: &[Collection],
) -> DbResult<()> {
    for collection in collections {
        write_raw(conn, *collection, &data.collection_json(*collection)?).await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use frigo_core::{Collection, CoreError, Customer, Money, Product};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_collection_reads_empty() {
        let db = db().await;
        let products: Vec<Product> = db.collections().get(Collection::Products).await.unwrap();
        assert!(products.is_empty());
        assert!(!db.collections().exists(Collection::Products).await.unwrap());
    }

    #[tokio::test]
    async fn test_all_data_covers_every_collection() {
        let db = db().await;
        db.collections().init().await.unwrap();

        let data = db.collections().all_data().await.unwrap();
        assert_eq!(data.categories.len(), 3);
        assert_eq!(data.products.len(), 3);
        assert_eq!(data.batches.len(), 3);
        assert_eq!(data.customers.len(), 3);
        assert!(data.sales.is_empty());
        assert!(data.sale_details.is_empty());
    }

    #[tokio::test]
    async fn test_init_seeds_only_missing() {
        let db = db().await;
        let repo = db.collections();

        repo.save::<Customer>(Collection::Customers, &[]).await.unwrap();
        let seeded = repo.init().await.unwrap();

        assert_eq!(seeded.len(), 5);
        assert!(!seeded.contains(&Collection::Customers));
        let customers: Vec<Customer> = repo.get(Collection::Customers).await.unwrap();
        assert!(customers.is_empty());

        assert!(repo.init().await.unwrap().is_empty());
        let data = repo.load_dataset().await.unwrap();
        assert_eq!(data.products.len(), 3);
        assert_eq!(data.categories.len(), 3);
    }

    #[tokio::test]
    async fn test_mutate_rolls_back_on_error() {
        let db = db().await;
        let repo = db.collections();
        repo.init().await.unwrap();

        let result = repo
            .mutate(&[Collection::Products], |data| {
                data.products.clear();
                Err::<(), _>(CoreError::not_found("Product", "x"))
            })
            .await;
        assert!(result.unwrap_err().is_not_found());

        let products: Vec<Product> = repo.get(Collection::Products).await.unwrap();
        assert_eq!(products.len(), 3);
    }

    #[tokio::test]
    async fn test_reset_partial_and_full() {
        let db = db().await;
        let repo = db.collections();
        repo.init().await.unwrap();

        repo.mutate(&[Collection::Products, Collection::Customers], |data| {
            data.products.retain(|p| p.id != "p1");
            data.customers[1].credit_limit = Money::from_pesos(1);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(repo.reset(false).await.unwrap(), 1);
        let data = repo.load_dataset().await.unwrap();
        assert!(data.product("p1").is_ok());
        assert_eq!(data.customer("c2").unwrap().credit_limit, Money::from_pesos(1));

        db.settings().set_linked_id("AB12CD").await.unwrap();
        repo.reset(true).await.unwrap();
        let data = repo.load_dataset().await.unwrap();
        assert_eq!(data.customer("c2").unwrap().credit_limit, Money::from_pesos(500000));
        assert!(db.settings().linked_id().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_apply_snapshot_is_gated_by_watermark() {
        let db = db().await;
        let repo = db.collections();
        repo.init().await.unwrap();

        let mut remote = repo.load_dataset().await.unwrap();
        remote.products.truncate(1);
        remote.categories.clear();

        assert!(repo.apply_snapshot(&remote, 1_000).await.unwrap());
        assert_eq!(db.settings().last_sync_ts().await.unwrap(), 1_000);

        let local = repo.load_dataset().await.unwrap();
        assert_eq!(local.products.len(), 1);
        // Categories are never pulled
        assert_eq!(local.categories.len(), 3);

        remote.products.clear();
        assert!(!repo.apply_snapshot(&remote, 1_000).await.unwrap());
        assert!(!repo.apply_snapshot(&remote, 999).await.unwrap());
        assert_eq!(repo.load_dataset().await.unwrap().products.len(), 1);
    }
}
