//! # Inventory Repository
//!
//! Catalog and batch operations, each committed as one transaction.

use chrono::{Local, Utc};
use frigo_core::import::{self, ImportRow, ImportSummary};
use frigo_core::inventory::{self, NewBatch, NewProduct};
use frigo_core::reports::{self, ProductStock};
use frigo_core::{Batch, Category, Collection, Money, Product};
use tracing::info;

use crate::error::DbResult;
use crate::repository::collection::CollectionRepository;

/// Repository for catalog and stock.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    store: CollectionRepository,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(store: CollectionRepository) -> Self {
        InventoryRepository { store }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn categories(&self) -> DbResult<Vec<Category>> {
        self.store.get(Collection::Categories).await
    }

    pub async fn products(&self) -> DbResult<Vec<Product>> {
        self.store.get(Collection::Products).await
    }

    pub async fn batches(&self) -> DbResult<Vec<Batch>> {
        self.store.get(Collection::Batches).await
    }

    /// The batch a sale of `quantity` units would draw from right now.
    pub async fn allocate(&self, product_id: &str, quantity: i64) -> DbResult<Batch> {
        let batches = self.batches().await?;
        let batch = inventory::allocate_fefo(&batches, product_id, quantity)?;
        Ok(batch.clone())
    }

    /// Stock on hand per product.
    pub async fn stock_levels(&self) -> DbResult<Vec<ProductStock>> {
        let data = self.store.load_dataset().await?;
        Ok(reports::stock_levels(&data))
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn add_category(&self, name: &str, description: &str) -> DbResult<String> {
        self.store
            .mutate(&[Collection::Categories], |data| {
                inventory::add_category(data, name, description)
            })
            .await
    }

    pub async fn add_product(&self, input: NewProduct) -> DbResult<String> {
        let id = self
            .store
            .mutate(&[Collection::Products], |data| {
                inventory::add_product(data, input)
            })
            .await?;
        info!(product_id = %id, "Product added");
        Ok(id)
    }

    pub async fn update_product(&self, product: Product) -> DbResult<()> {
        self.store
            .mutate(&[Collection::Products], |data| {
                inventory::update_product(data, product)
            })
            .await
    }

    pub async fn update_prices(
        &self,
        product_id: &str,
        cost_price: Money,
        sale_price: Money,
    ) -> DbResult<()> {
        self.store
            .mutate(&[Collection::Products], |data| {
                inventory::update_prices(data, product_id, cost_price, sale_price)
            })
            .await
    }

    /// Deletes a product and its batches. Returns how many batches went.
    pub async fn delete_product(&self, product_id: &str) -> DbResult<usize> {
        let removed = self
            .store
            .mutate(&[Collection::Products, Collection::Batches], |data| {
                inventory::delete_product(data, product_id)
            })
            .await?;
        info!(product_id, batches_removed = removed, "Product deleted");
        Ok(removed)
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Receives a batch dated today (device local time).
    pub async fn add_batch(&self, input: NewBatch) -> DbResult<String> {
        let today = Local::now().date_naive();
        let id = self
            .store
            .mutate(&[Collection::Batches], |data| {
                inventory::add_batch(data, input, today)
            })
            .await?;
        info!(batch_id = %id, "Batch received");
        Ok(id)
    }

    /// Bulk import. Every row lands or none do.
    pub async fn import_rows(&self, rows: &[ImportRow]) -> DbResult<ImportSummary> {
        let today = Local::now().date_naive();
        let now_millis = Utc::now().timestamp_millis();

        let summary = self
            .store
            .mutate(
                &[
                    Collection::Categories,
                    Collection::Products,
                    Collection::Batches,
                ],
                |data| import::import_rows(data, rows, today, now_millis),
            )
            .await?;

        info!(
            rows = rows.len(),
            categories = summary.categories_created,
            products = summary.products_created,
            batches = summary.batches_created,
            "Import committed"
        );
        Ok(summary)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
