//! # Customer Ledger
//!
//! Customer records and the credit balance derived from sale history.
//!
//! ## Balance Invariant
//! ```text
//! current_balance(c) = Σ sale.outstanding_credit()   for sales of c
//!
//!   Credit + Pending, not Returned ──► total
//!   Credit + Pending, Returned     ──► total − returned_credit
//!   everything else                ──► 0
//! ```
//!
//! A partial return on outstanding credit marks the whole sale Returned but
//! only credits the returned units, so the sale keeps owing the rest. The
//! credit is stored on the sale (`returned_credit`) and netted here, which
//! keeps a recompute equal to what the engine produced incrementally.
//! Returned sales without `returned_credit` count as fully returned.
//!
//! The sales engine keeps the balance current incrementally.
//! [`recompute_balances`] rebuilds it from scratch and is the repair path
//! when the two disagree (a replicated overwrite, a hand edit, a floored
//! settlement or return credit).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::dataset::Dataset;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Coordinates, Customer, Sale};
use crate::validation::{validate_amount, validate_name, validate_visit_day};

// =============================================================================
// Customer Records
// =============================================================================

/// Editable customer fields.
///
/// The balance is not among them: new customers start at zero and edits
/// keep whatever the ledger holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    /// `None` registers a new customer.
    #[serde(default)]
    pub id: Option<String>,
    pub business_name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    /// Defaults to the depot when omitted.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub credit_limit: Money,
    pub visit_day: u8,
}

/// Registers or edits a customer and returns its id.
pub fn upsert_customer(data: &mut Dataset, input: CustomerInput) -> CoreResult<String> {
    validate_name("businessName", &input.business_name)?;
    validate_amount("creditLimit", input.credit_limit)?;
    validate_visit_day(input.visit_day)?;

    let coordinates = input.coordinates.unwrap_or_default();

    match input.id {
        Some(id) => {
            let customer = data.customer_mut(&id)?;
            customer.business_name = input.business_name.trim().to_string();
            customer.contact_person = input.contact_person;
            customer.phone = input.phone;
            customer.address = input.address;
            customer.city = input.city;
            customer.coordinates = coordinates;
            customer.credit_limit = input.credit_limit;
            customer.visit_day = input.visit_day;
            Ok(id)
        }
        None => {
            let id = Uuid::new_v4().to_string();
            data.customers.push(Customer {
                id: id.clone(),
                business_name: input.business_name.trim().to_string(),
                contact_person: input.contact_person,
                phone: input.phone,
                address: input.address,
                city: input.city,
                coordinates,
                credit_limit: input.credit_limit,
                current_balance: Money::zero(),
                visit_day: input.visit_day,
            });
            Ok(id)
        }
    }
}

/// Removes a customer. Their past sales stay in history.
pub fn delete_customer(data: &mut Dataset, customer_id: &str) -> CoreResult<()> {
    let before = data.customers.len();
    data.customers.retain(|c| c.id != customer_id);
    if data.customers.len() == before {
        return Err(CoreError::not_found("Customer", customer_id));
    }
    Ok(())
}

// =============================================================================
// Reconciliation
// =============================================================================

/// A balance that `recompute_balances` changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCorrection {
    pub customer_id: String,
    pub previous: Money,
    pub recomputed: Money,
}

/// The balance a customer should carry according to sale history.
pub fn expected_balance(data: &Dataset, customer_id: &str) -> Money {
    data.sales
        .iter()
        .filter(|s| s.customer_id == customer_id)
        .map(Sale::outstanding_credit)
        .sum()
}

/// Rebuilds every customer's balance from sale history.
///
/// Idempotent: a second call returns no corrections. Sales whose customer
/// no longer exists are skipped.
pub fn recompute_balances(data: &mut Dataset) -> Vec<BalanceCorrection> {
    let recomputed: Vec<Money> = data
        .customers
        .iter()
        .map(|c| expected_balance(data, &c.id))
        .collect();

    let mut corrections = Vec::new();
    for (customer, balance) in data.customers.iter_mut().zip(recomputed) {
        if customer.current_balance != balance {
            corrections.push(BalanceCorrection {
                customer_id: customer.id.clone(),
                previous: customer.current_balance,
                recomputed: balance,
            });
            customer.current_balance = balance;
        }
    }
    corrections
}

// =============================================================================
// Unit Tests
// =============================================================================
