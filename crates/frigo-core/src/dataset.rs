//! # Dataset
//!
//! The whole logical store held in memory: six named collections.
//!
//! ## Collections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Collection      Storage key                 Replicated by pull?        │
//! │  ─────────────   ─────────────────────────   ───────────────────        │
//! │  Categories      frigogest_categories        no                         │
//! │  Products        frigogest_products          yes                        │
//! │  Batches         frigogest_batches           yes                        │
//! │  Customers       frigogest_customers         yes                        │
//! │  Sales           frigogest_sales             yes                        │
//! │  SaleDetails     frigogest_sale_details      yes                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Engine operations take `&mut Dataset`, and the storage layer commits the
//! collections an operation touched in one transaction. When an operation
//! returns an error the working copy is dropped, so nothing half-applied
//! ever reaches storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Batch, Category, Customer, Product, Sale, SaleDetail};

// =============================================================================
// Collection Keys
// =============================================================================

/// A named collection in the persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Categories,
    Products,
    Batches,
    Customers,
    Sales,
    SaleDetails,
}

impl Collection {
    /// Every collection, in seeding order.
    pub const ALL: [Collection; 6] = [
        Collection::Categories,
        Collection::Products,
        Collection::Batches,
        Collection::Customers,
        Collection::Sales,
        Collection::SaleDetails,
    ];

    /// The collections a pull overwrites. Categories are not among them.
    pub const REPLICATED: [Collection; 5] = [
        Collection::Products,
        Collection::Batches,
        Collection::Customers,
        Collection::Sales,
        Collection::SaleDetails,
    ];

    /// Storage key for this collection.
    pub const fn key(&self) -> &'static str {
        match self {
            Collection::Categories => "frigogest_categories",
            Collection::Products => "frigogest_products",
            Collection::Batches => "frigogest_batches",
            Collection::Customers => "frigogest_customers",
            Collection::Sales => "frigogest_sales",
            Collection::SaleDetails => "frigogest_sale_details",
        }
    }

    /// Looks a collection up by its storage key.
    pub fn from_key(key: &str) -> Option<Self> {
        Collection::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// All six collections.
///
/// Serializes to the same object shape the replication payload uses:
/// `{categories, products, batches, customers, sales, saleDetails}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub batches: Vec<Batch>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub sale_details: Vec<SaleDetail>,
}

impl Dataset {
    /// Serializes one collection to its stored JSON array.
    pub fn collection_json(&self, collection: Collection) -> serde_json::Result<String> {
        match collection {
            Collection::Categories => serde_json::to_string(&self.categories),
            Collection::Products => serde_json::to_string(&self.products),
            Collection::Batches => serde_json::to_string(&self.batches),
            Collection::Customers => serde_json::to_string(&self.customers),
            Collection::Sales => serde_json::to_string(&self.sales),
            Collection::SaleDetails => serde_json::to_string(&self.sale_details),
        }
    }

    /// Replaces one collection from its stored JSON array.
    pub fn load_collection_json(
        &mut self,
        collection: Collection,
        json: &str,
    ) -> serde_json::Result<()> {
        match collection {
            Collection::Categories => self.categories = serde_json::from_str(json)?,
            Collection::Products => self.products = serde_json::from_str(json)?,
            Collection::Batches => self.batches = serde_json::from_str(json)?,
            Collection::Customers => self.customers = serde_json::from_str(json)?,
            Collection::Sales => self.sales = serde_json::from_str(json)?,
            Collection::SaleDetails => self.sale_details = serde_json::from_str(json)?,
        }
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn product(&self, id: &str) -> CoreResult<&Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::not_found("Product", id))
    }

    pub fn batch(&self, id: &str) -> CoreResult<&Batch> {
        self.batches
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| CoreError::not_found("Batch", id))
    }

    pub fn customer(&self, id: &str) -> CoreResult<&Customer> {
        self.customers
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CoreError::not_found("Customer", id))
    }

    pub fn customer_mut(&mut self, id: &str) -> CoreResult<&mut Customer> {
        self.customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CoreError::not_found("Customer", id))
    }

    pub fn sale(&self, id: &str) -> CoreResult<&Sale> {
        self.sales
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::not_found("Sale", id))
    }

    pub fn sale_mut(&mut self, id: &str) -> CoreResult<&mut Sale> {
        self.sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::not_found("Sale", id))
    }

    /// Line items of one sale, in creation order.
    pub fn details_for_sale<'a>(&'a self, sale_id: &'a str) -> impl Iterator<Item = &'a SaleDetail> + 'a {
        self.sale_details.iter().filter(move |d| d.sale_id == sale_id)
    }

    /// Batches of one product, in stored order.
    pub fn batches_for_product<'a>(&'a self, product_id: &'a str) -> impl Iterator<Item = &'a Batch> + 'a {
        self.batches.iter().filter(move |b| b.product_id == product_id)
    }

    /// Total record count across every collection (diagnostics).
    pub fn record_count(&self) -> usize {
        self.categories.len()
            + self.products.len()
            + self.batches.len()
            + self.customers.len()
            + self.sales.len()
            + self.sale_details.len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
