//! # Inventory Ledger
//!
//! Batch creation, FEFO allocation and the only code that moves
//! `Batch::current_qty`.
//!
//! ## FEFO Allocation
//! ```text
//! allocate_fefo("p1", 10)
//!
//!   b1  expiry 2025-06-01  qty 85  Available   ✓ candidate
//!   b3  expiry 2024-04-20  qty 12  Available   ✓ candidate  ◄── earliest expiry wins
//!   b4  expiry 2024-03-30  qty  6  Available   ✗ too small (no splitting)
//!   b5  expiry 2024-03-15  qty 40  Quarantine  ✗ not allocatable
//! ```
//!
//! Allocation is single-batch: a quantity is never split across batches.
//! When no one batch holds the full amount the caller gets
//! `InsufficientStock` and can retry with a smaller line.
//!
//! ## Quantity Bounds
//! `decrement_batch` and `restore_batch` keep `0 <= current_qty <= initial_qty`
//! by rejecting the move, never by clamping it.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::dataset::Dataset;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Batch, BatchStatus, Category, Product};
use crate::validation::{
    validate_amount, validate_batch_code, validate_name, validate_non_negative, validate_quantity,
};

// =============================================================================
// Allocation and Stock Movement
// =============================================================================

/// Picks the Available batch of `product_id` with the earliest expiry among
/// those holding at least `quantity` units.
///
/// Batches with the same expiry date resolve to the first one in stored
/// order.
///
/// ## Errors
/// - `InvalidQuantity` when `quantity < 1`
/// - `InsufficientStock` when no single batch qualifies; `available` is the
///   largest single-batch quantity on hand
pub fn allocate_fefo<'a>(
    batches: &'a [Batch],
    product_id: &str,
    quantity: i64,
) -> CoreResult<&'a Batch> {
    if quantity < 1 {
        return Err(CoreError::invalid_quantity(quantity, "must be at least 1"));
    }

    let candidates = batches
        .iter()
        .filter(|b| b.product_id == product_id && b.status.is_allocatable());

    // min_by_key keeps the first of equal keys, which preserves stored order
    let chosen = candidates
        .clone()
        .filter(|b| b.current_qty >= quantity)
        .min_by_key(|b| b.expiry_date);

    chosen.ok_or_else(|| CoreError::InsufficientStock {
        product_id: product_id.to_string(),
        available: candidates.map(|b| b.current_qty).max().unwrap_or(0),
        requested: quantity,
    })
}

/// Total units on hand for a product, across every batch and status.
pub fn product_stock(batches: &[Batch], product_id: &str) -> i64 {
    batches
        .iter()
        .filter(|b| b.product_id == product_id)
        .map(|b| b.current_qty)
        .sum()
}

/// Takes `quantity` units out of a batch.
///
/// ## Errors
/// - `NotFound` for an unknown batch
/// - `InvalidQuantity` for a non-positive quantity
/// - `InsufficientStock` when the batch would go below zero
pub fn decrement_batch(batches: &mut [Batch], batch_id: &str, quantity: i64) -> CoreResult<()> {
    if quantity < 1 {
        return Err(CoreError::invalid_quantity(quantity, "must be at least 1"));
    }

    let batch = find_batch_mut(batches, batch_id)?;

    if batch.current_qty < quantity {
        return Err(CoreError::InsufficientStock {
            product_id: batch.product_id.clone(),
            available: batch.current_qty,
            requested: quantity,
        });
    }

    batch.current_qty -= quantity;
    Ok(())
}

/// Puts `quantity` units back into a batch.
///
/// ## Errors
/// - `NotFound` for an unknown batch
/// - `InvalidQuantity` for a non-positive quantity
/// - `StockOverflow` when the batch would exceed its `initial_qty`
pub fn restore_batch(batches: &mut [Batch], batch_id: &str, quantity: i64) -> CoreResult<()> {
    if quantity < 1 {
        return Err(CoreError::invalid_quantity(quantity, "must be at least 1"));
    }

    let batch = find_batch_mut(batches, batch_id)?;

    if quantity > batch.restore_headroom() {
        return Err(CoreError::StockOverflow {
            batch_id: batch.id.clone(),
            initial_qty: batch.initial_qty,
            attempted: batch.current_qty + quantity,
        });
    }

    batch.current_qty += quantity;
    Ok(())
}

fn find_batch_mut<'a>(batches: &'a mut [Batch], batch_id: &str) -> CoreResult<&'a mut Batch> {
    batches
        .iter_mut()
        .find(|b| b.id == batch_id)
        .ok_or_else(|| CoreError::not_found("Batch", batch_id))
}

// =============================================================================
// Catalog
// =============================================================================

/// Fields for a new product. The id is generated.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost_price: Money,
    pub sale_price: Money,
    pub min_stock: i64,
    pub unit: String,
    pub shelf_life_days: i64,
}

fn validate_product_fields(
    name: &str,
    unit: &str,
    cost: Money,
    sale: Money,
    min_stock: i64,
    shelf_life_days: i64,
) -> CoreResult<()> {
    validate_name("name", name)?;
    validate_name("unit", unit)?;
    validate_amount("costPrice", cost)?;
    validate_amount("salePrice", sale)?;
    validate_non_negative("minStock", min_stock)?;
    validate_non_negative("shelfLifeDays", shelf_life_days)?;
    Ok(())
}

/// Adds a product and returns its id.
pub fn add_product(data: &mut Dataset, input: NewProduct) -> CoreResult<String> {
    validate_product_fields(
        &input.name,
        &input.unit,
        input.cost_price,
        input.sale_price,
        input.min_stock,
        input.shelf_life_days,
    )?;

    let id = Uuid::new_v4().to_string();
    data.products.push(Product {
        id: id.clone(),
        category_id: input.category_id,
        name: input.name.trim().to_string(),
        description: input.description,
        cost_price: input.cost_price,
        sale_price: input.sale_price,
        min_stock: input.min_stock,
        unit: input.unit.trim().to_string(),
        shelf_life_days: input.shelf_life_days,
    });
    Ok(id)
}

/// Replaces an existing product with an edited copy (matched by id).
pub fn update_product(data: &mut Dataset, product: Product) -> CoreResult<()> {
    validate_product_fields(
        &product.name,
        &product.unit,
        product.cost_price,
        product.sale_price,
        product.min_stock,
        product.shelf_life_days,
    )?;

    let slot = data
        .products
        .iter_mut()
        .find(|p| p.id == product.id)
        .ok_or_else(|| CoreError::not_found("Product", &product.id))?;
    *slot = product;
    Ok(())
}

/// Changes a product's cost and sale price.
///
/// Existing sale details keep the unit price they were sold at.
pub fn update_prices(
    data: &mut Dataset,
    product_id: &str,
    cost_price: Money,
    sale_price: Money,
) -> CoreResult<()> {
    validate_amount("costPrice", cost_price)?;
    validate_amount("salePrice", sale_price)?;

    let product = data
        .products
        .iter_mut()
        .find(|p| p.id == product_id)
        .ok_or_else(|| CoreError::not_found("Product", product_id))?;
    product.cost_price = cost_price;
    product.sale_price = sale_price;
    Ok(())
}

/// Adds a category and returns its id. Names are unique, ignoring case.
pub fn add_category(data: &mut Dataset, name: &str, description: &str) -> CoreResult<String> {
    validate_name("name", name)?;
    let name = name.trim();

    if data
        .categories
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(name))
    {
        return Err(ValidationError::Duplicate {
            field: "category".to_string(),
            value: name.to_string(),
        }
        .into());
    }

    let id = Uuid::new_v4().to_string();
    data.categories.push(Category {
        id: id.clone(),
        name: name.to_string(),
        description: description.to_string(),
    });
    Ok(id)
}

/// Removes a product and every batch that belongs to it.
///
/// Irreversible. Sale details that consumed those batches keep their ids.
/// Returns the number of batches removed.
pub fn delete_product(data: &mut Dataset, product_id: &str) -> CoreResult<usize> {
    data.product(product_id)?;

    data.products.retain(|p| p.id != product_id);
    let before = data.batches.len();
    data.batches.retain(|b| b.product_id != product_id);
    Ok(before - data.batches.len())
}

// =============================================================================
// Batch Reception
// =============================================================================

/// A batch being received into stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
    pub product_id: String,
    pub batch_code: String,
    /// Defaults to the entry date plus the product's shelf life.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    pub quantity: i64,
    pub reception_temp: f64,
}

/// Receives a batch: entry date `today`, `initial_qty = current_qty =
/// quantity`, status Available. Returns the new batch id.
pub fn add_batch(data: &mut Dataset, input: NewBatch, today: NaiveDate) -> CoreResult<String> {
    validate_batch_code(&input.batch_code)?;
    validate_quantity("quantity", input.quantity)?;

    let product = data.product(&input.product_id)?;
    let expiry_date = input
        .expiry_date
        .unwrap_or_else(|| today + Duration::days(product.shelf_life_days));

    let id = Uuid::new_v4().to_string();
    data.batches.push(Batch {
        id: id.clone(),
        product_id: input.product_id,
        batch_code: input.batch_code.trim().to_string(),
        entry_date: today,
        expiry_date,
        initial_qty: input.quantity,
        current_qty: input.quantity,
        reception_temp: input.reception_temp,
        status: BatchStatus::Available,
    });
    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================
