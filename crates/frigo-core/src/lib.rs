//! # frigo-core: Pure Business Logic for FrigoGest
//!
//! Inventory, sales and customer-ledger rules for a frozen-food
//! distributor, as pure functions over an in-memory [`Dataset`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FrigoGest Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              apps/device (CLI + sync daemon)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ frigo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ inventory │  │   sales   │  │  ledger   │  │  reports  │  │   │
//! │  │   │   FEFO    │  │ create    │  │ balances  │  │ dashboard │  │   │
//! │  │   │  batches  │  │ return    │  │ customers │  │ route day │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      frigo-db (SQLite store)     frigo-sync (replication)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Product, Batch, Customer, Sale, ...)
//! - [`money`] - Whole-peso `Money`
//! - [`dataset`] - The six collections and their storage keys
//! - [`inventory`] - FEFO allocation, stock movement, catalog edits
//! - [`sales`] - Sale creation, status machine, returns
//! - [`ledger`] - Customers and balance reconciliation
//! - [`reports`] - Dashboard figures and route stops
//! - [`import`] - Bulk stock import
//! - [`seed`] - Default data for a fresh store
//! - [`validation`] - Input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use frigo_core::sales::{create_sale, mark_delivered, SaleDraft};
//! use frigo_core::{seed, PaymentMethod};
//!
//! let mut data = seed::dataset();
//!
//! let (sale, lines) = SaleDraft::new("c1", "admin", PaymentMethod::Credit)
//!     .line("p1", 2)
//!     .plan(&data, Utc::now())
//!     .unwrap();
//! let sale_id = sale.id.clone();
//! create_sale(&mut data, sale, lines).unwrap();
//!
//! // c1 starts at 50.000 and owes 2 × 15.000 more
//! assert_eq!(data.customer("c1").unwrap().current_balance.pesos(), 80000);
//!
//! mark_delivered(&mut data, &sale_id, true).unwrap();
//! assert_eq!(data.customer("c1").unwrap().current_balance.pesos(), 50000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dataset;
pub mod error;
pub mod import;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod reports;
pub mod sales;
pub mod seed;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use dataset::{Collection, Dataset};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Batches expiring within this many days are flagged on the dashboard
/// and in the inventory insight.
pub const EXPIRY_WARNING_DAYS: i64 = 15;

/// Minimum stock given to products created by a bulk import.
pub const DEFAULT_MIN_STOCK: i64 = 10;

/// Packaging unit given to products created by a bulk import.
pub const DEFAULT_UNIT: &str = "Unidad";

/// Shelf life given to products created by a bulk import.
pub const DEFAULT_SHELF_LIFE_DAYS: i64 = 90;

/// Reception temperature (°C) assumed when an import row omits it.
pub const DEFAULT_RECEPTION_TEMP: f64 = -18.0;

/// Largest price, fee or credit limit accepted, in pesos.
///
/// With [`MAX_LINE_QUANTITY`] this keeps any line subtotal far inside `i64`.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Largest quantity accepted on a single order or batch line.
///
/// ## Business Reason
/// Catches a mistyped quantity (9999 instead of 99) before it drains a batch.
pub const MAX_LINE_QUANTITY: i64 = 9_999;
