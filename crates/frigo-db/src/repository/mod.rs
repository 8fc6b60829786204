//! # Repositories
//!
//! One repository per concern. All of them except [`settings`] go through
//! [`collection::CollectionRepository`], which owns the transaction.

pub mod collection;
pub mod customer;
pub mod inventory;
pub mod sale;
pub mod settings;
