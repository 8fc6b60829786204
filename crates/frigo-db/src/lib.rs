//! # frigo-db: Persistent Store for FrigoGest
//!
//! Durable home of the six collections and the device settings, on SQLite
//! via sqlx. Engine rules live in `frigo-core`; this crate loads a
//! [`frigo_core::Dataset`], runs the rule, and commits the result.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FrigoGest Data Flow                              │
//! │                                                                         │
//! │  CLI command (sale, return, repair)      Sync agent (pull / push)      │
//! │       │                                        │                        │
//! │       ▼                                        ▼                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     frigo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Collection    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Inventory     │    │ 001_initial  │  │   │
//! │  │   │ write_lock    │    │ Sale          │    │              │  │   │
//! │  │   │               │    │ Customer      │    │              │  │   │
//! │  │   │               │    │ Settings      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   collections(key, data JSON)      device_settings(key, value)  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use frigo_db::{Database, DbConfig};
//! use frigo_core::sales::SaleDraft;
//! use frigo_core::PaymentMethod;
//!
//! let db = Database::new(DbConfig::new("frigogest.db")).await?;
//! db.collections().init().await?;
//!
//! let draft = SaleDraft::new("c1", "admin", PaymentMethod::Credit).line("p1", 2);
//! let sale = db.sales().create_from_draft(&draft).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::collection::CollectionRepository;
pub use repository::customer::CustomerRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::sale::SaleRepository;
pub use repository::settings::SettingsRepository;
