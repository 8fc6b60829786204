//! # Sales Engine
//!
//! Sale creation, status updates and returns, with their effect on stock
//! and on the customer's credit balance.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SaleDraft ──plan()──► (Sale, [LineItem]) ──create_sale()──► stored    │
//! │     │                        │                     │                    │
//! │     │ FEFO per line          │ batch bound         ├── batches −= qty  │
//! │     │                        │ per line            ├── details pushed  │
//! │     ▼                        ▼                     └── Credit: bal += │
//! │                                                                         │
//! │  update_sale / mark_delivered                                          │
//! │     Pending ──► Paid     Credit: balance −= total (floored at 0)       │
//! │                                                                         │
//! │  process_return                                                        │
//! │     batches += qty, logs appended, Credit+Pending: balance −= credit   │
//! │     and the credit is kept on the sale as returned_credit               │
//! │     deliveryStatus = Returned (whole sale, even for partial returns)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! Every operation validates first and mutates last. An `Err` leaves the
//! dataset exactly as it was, so the storage layer can simply skip the
//! commit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::dataset::Dataset;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::inventory::{allocate_fefo, decrement_batch, restore_batch};
use crate::money::Money;
use crate::types::{DeliveryStatus, PaymentMethod, PaymentStatus, Sale, SaleDetail};
use crate::validation::{validate_amount, validate_quantity};
use crate::MAX_AMOUNT;

// =============================================================================
// Drafting
// =============================================================================

/// Which front end captured the order. Decides the initial payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DraftOrigin {
    /// Office counter: every sale starts Pending until delivery settles it.
    #[default]
    Counter,
    /// Seller on the route: Credit starts Pending, cash and transfer are
    /// collected on the spot.
    Field,
}

/// A line bound to the batch it will consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub batch_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl LineItem {
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Builder for a new sale.
///
/// ## Usage
/// ```rust
/// use chrono::Utc;
/// use frigo_core::sales::{create_sale, DraftOrigin, SaleDraft};
/// use frigo_core::types::PaymentMethod;
/// use frigo_core::seed;
///
/// let mut data = seed::dataset();
/// let (sale, lines) = SaleDraft::new("c2", "admin", PaymentMethod::Cash)
///     .origin(DraftOrigin::Field)
///     .line("p2", 3)
///     .plan(&data, Utc::now())
///     .unwrap();
///
/// assert_eq!(sale.total.pesos(), 66000);
/// create_sale(&mut data, sale, lines).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SaleDraft {
    customer_id: String,
    seller_id: String,
    payment_method: PaymentMethod,
    delivery_fee: Option<Money>,
    origin: DraftOrigin,
    lines: Vec<(String, i64)>,
}

impl SaleDraft {
    pub fn new(
        customer_id: impl Into<String>,
        seller_id: impl Into<String>,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            seller_id: seller_id.into(),
            payment_method,
            delivery_fee: None,
            origin: DraftOrigin::Counter,
            lines: Vec::new(),
        }
    }

    pub fn origin(mut self, origin: DraftOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn delivery_fee(mut self, fee: Money) -> Self {
        self.delivery_fee = Some(fee);
        self
    }

    /// Adds `quantity` units of a product.
    pub fn line(mut self, product_id: impl Into<String>, quantity: i64) -> Self {
        self.lines.push((product_id.into(), quantity));
        self
    }

    /// Allocates every line with FEFO and prices it at the product's sale
    /// price.
    ///
    /// Lines are allocated in order against a running copy of the stock, so
    /// two lines of the same product never count the same units twice.
    pub fn plan(&self, data: &Dataset, now: DateTime<Utc>) -> CoreResult<(Sale, Vec<LineItem>)> {
        data.customer(&self.customer_id)?;

        if self.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "lines".to_string(),
            }
            .into());
        }

        let mut stock = data.batches.clone();
        let mut items = Vec::with_capacity(self.lines.len());

        for (product_id, quantity) in &self.lines {
            validate_quantity("quantity", *quantity)?;
            let product = data.product(product_id)?;
            validate_amount("salePrice", product.sale_price)?;
            let batch_id = allocate_fefo(&stock, product_id, *quantity)?.id.clone();
            decrement_batch(&mut stock, &batch_id, *quantity)?;

            items.push(LineItem {
                product_id: product_id.clone(),
                batch_id,
                quantity: *quantity,
                unit_price: product.sale_price,
            });
        }

        let fee = self.delivery_fee.unwrap_or_default();
        validate_amount("deliveryFee", fee)?;
        let total = sale_total(&items, fee)?;

        let payment_status = match (self.origin, self.payment_method) {
            (DraftOrigin::Field, method) if !method.is_credit() => PaymentStatus::Paid,
            _ => PaymentStatus::Pending,
        };

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            customer_id: self.customer_id.clone(),
            seller_id: self.seller_id.clone(),
            date: now,
            total,
            delivery_fee: self.delivery_fee,
            payment_method: self.payment_method,
            payment_status,
            delivery_status: DeliveryStatus::InRoute,
            return_logs: None,
            returned_credit: None,
        };

        Ok((sale, items))
    }
}

// =============================================================================
// Creation
// =============================================================================

/// Σ line subtotals + fee, rejecting totals that overflow.
fn sale_total(lines: &[LineItem], fee: Money) -> CoreResult<Money> {
    let total = lines.iter().try_fold(fee, |acc, line| {
        line.unit_price
            .checked_mul_quantity(line.quantity)
            .and_then(|subtotal| acc.checked_add(subtotal))
    });
    total.ok_or_else(|| {
        ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: MAX_AMOUNT,
        }
        .into()
    })
}

/// A new sale starts in the warehouse or on the route, with no return
/// history, and a Credit sale starts Pending.
fn check_initial_state(sale: &Sale) -> CoreResult<()> {
    if !matches!(
        sale.delivery_status,
        DeliveryStatus::Warehouse | DeliveryStatus::InRoute
    ) {
        return Err(CoreError::invalid_transition("Sale", "new", sale.delivery_status));
    }
    if sale.payment_method.is_credit() && sale.payment_status != PaymentStatus::Pending {
        return Err(CoreError::invalid_transition("Payment", "new", sale.payment_status));
    }
    let has_returns = sale.return_logs.as_ref().is_some_and(|logs| !logs.is_empty());
    if sale.returned_credit.is_some() || has_returns {
        return Err(ValidationError::InvalidFormat {
            field: "returnLogs".to_string(),
            reason: "a new sale has no returns".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Records a sale together with its lines.
///
/// ## Effects (all or nothing)
/// 1. Each line's batch loses `quantity` units
/// 2. One [`SaleDetail`] per line, bound to `sale.id`
/// 3. Credit sales add `sale.total` to the customer's balance
/// 4. The sale is appended
///
/// ## Errors
/// - `InvalidTransition` unless the sale starts in Warehouse or In Route,
///   with a Credit sale still Pending
/// - `NotFound` for an unknown customer, product or batch
/// - `InvalidQuantity` / `Validation` for malformed lines or totals
/// - `InsufficientStock` when a batch no longer holds what the lines need
/// - `CreditLimitExceeded` when a Credit sale would pass the customer's limit
pub fn create_sale(data: &mut Dataset, sale: Sale, lines: Vec<LineItem>) -> CoreResult<()> {
    if data.sales.iter().any(|s| s.id == sale.id) {
        return Err(ValidationError::Duplicate {
            field: "saleId".to_string(),
            value: sale.id,
        }
        .into());
    }
    check_initial_state(&sale)?;
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        }
        .into());
    }

    for line in &lines {
        validate_quantity("quantity", line.quantity)?;
        validate_amount("unitPrice", line.unit_price)?;
        let batch = data.batch(&line.batch_id)?;
        if batch.product_id != line.product_id {
            return Err(ValidationError::InvalidFormat {
                field: "batchId".to_string(),
                reason: format!("batch {} does not hold product {}", batch.id, line.product_id),
            }
            .into());
        }
    }

    let fee = sale.delivery_fee.unwrap_or_default();
    validate_amount("deliveryFee", fee)?;
    let expected = sale_total(&lines, fee)?;
    if sale.total != expected {
        return Err(ValidationError::InvalidFormat {
            field: "total".to_string(),
            reason: format!("expected {expected}, got {}", sale.total),
        }
        .into());
    }

    let customer = data.customer(&sale.customer_id)?;
    let owed_after = customer.current_balance.checked_add(sale.total);
    if sale.payment_method.is_credit()
        && owed_after.map_or(true, |owed| owed > customer.credit_limit)
    {
        return Err(CoreError::CreditLimitExceeded {
            customer_id: customer.id.clone(),
            limit: customer.credit_limit,
            balance: customer.current_balance,
            requested: sale.total,
        });
    }

    // Stock is checked against a copy so a failing line leaves nothing behind
    let mut stock = data.batches.clone();
    for line in &lines {
        decrement_batch(&mut stock, &line.batch_id, line.quantity)?;
    }

    data.batches = stock;
    data.sale_details.extend(lines.into_iter().map(|line| SaleDetail {
        id: Uuid::new_v4().to_string(),
        sale_id: sale.id.clone(),
        subtotal: line.subtotal(),
        product_id: line.product_id,
        batch_id: line.batch_id,
        quantity: line.quantity,
        unit_price: line.unit_price,
    }));

    let owed = sale.outstanding_credit();
    if owed.is_positive() {
        data.customer_mut(&sale.customer_id)?.current_balance += owed;
    }
    data.sales.push(sale);

    Ok(())
}

// =============================================================================
// Status Updates
// =============================================================================

/// Status fields a caller may change on an existing sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleUpdate {
    #[serde(default)]
    pub delivery_status: Option<DeliveryStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

/// Applies a status update through the transition tables.
///
/// Settling a Credit sale (Pending → Paid) takes its total off the
/// customer's balance, floored at zero. A Returned sale accepts no update.
pub fn update_sale(data: &mut Dataset, sale_id: &str, update: SaleUpdate) -> CoreResult<()> {
    let sale = data.sale(sale_id)?;

    if sale.delivery_status == DeliveryStatus::Returned {
        let to = update
            .delivery_status
            .map(|s| s.to_string())
            .or_else(|| update.payment_status.map(|s| s.to_string()))
            .unwrap_or_else(|| "any state".to_string());
        return Err(CoreError::invalid_transition("Sale", DeliveryStatus::Returned, to));
    }

    if let Some(next) = update.delivery_status {
        if !sale.delivery_status.can_transition_to(next) {
            return Err(CoreError::invalid_transition("Delivery", sale.delivery_status, next));
        }
    }

    let settles = match update.payment_status {
        Some(next) if !sale.payment_status.can_transition_to(next) => {
            return Err(CoreError::invalid_transition("Payment", sale.payment_status, next));
        }
        Some(PaymentStatus::Paid) => sale.payment_status == PaymentStatus::Pending,
        _ => false,
    };

    let credit_settlement = (settles && sale.payment_method.is_credit())
        .then(|| (sale.customer_id.clone(), sale.total));

    let sale = data.sale_mut(sale_id)?;
    if let Some(next) = update.delivery_status {
        sale.delivery_status = next;
    }
    if let Some(next) = update.payment_status {
        sale.payment_status = next;
    }

    if let Some((customer_id, total)) = credit_settlement {
        // A customer deleted after the sale has no balance left to settle
        if let Some(customer) = data.customers.iter_mut().find(|c| c.id == customer_id) {
            customer.current_balance = customer.current_balance.floor_sub(total);
        }
    }

    Ok(())
}

/// Confirms delivery.
///
/// Cash and transfer sales become Paid. A Credit sale becomes Paid only
/// when `settle_now`; otherwise it stays Pending and keeps counting toward
/// the customer's balance. Returns the resulting payment status.
pub fn mark_delivered(
    data: &mut Dataset,
    sale_id: &str,
    settle_now: bool,
) -> CoreResult<PaymentStatus> {
    let sale = data.sale(sale_id)?;

    let payment_status = if sale.payment_method.is_credit() && !settle_now {
        sale.payment_status
    } else {
        PaymentStatus::Paid
    };

    update_sale(
        data,
        sale_id,
        SaleUpdate {
            delivery_status: Some(DeliveryStatus::Delivered),
            payment_status: Some(payment_status),
        },
    )?;
    Ok(payment_status)
}

// =============================================================================
// Returns
// =============================================================================

/// One line of a return request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    pub detail_id: String,
    pub quantity: i64,
}

/// Takes goods back from a customer.
///
/// ## Effects (all or nothing)
/// - Each item's units go back to the batch its detail consumed
/// - One timestamped log line per item, plus the reason, on `return_logs`
/// - For an outstanding Credit sale, the customer's balance drops by
///   `Σ unit_price × quantity`, floored at zero, and that credit is kept
///   on the sale as `returned_credit` so the rest stays owed
/// - The whole sale becomes `Returned`, even when only some units came back
///
/// Zero-quantity items are ignored. Returns the credit amount.
///
/// ## Errors
/// - `NotFound` (`Sale`, `SaleDetail`, `Batch`)
/// - `InvalidQuantity` for a negative quantity, an empty request, or more
///   units than the detail sold
/// - `InvalidTransition` when the sale is already Returned
/// - `StockOverflow` when a batch would pass its initial quantity
pub fn process_return(
    data: &mut Dataset,
    sale_id: &str,
    items: &[ReturnItem],
    reason: &str,
    now: DateTime<Utc>,
) -> CoreResult<Money> {
    let sale = data.sale(sale_id)?;
    if sale.delivery_status == DeliveryStatus::Returned {
        return Err(CoreError::invalid_transition(
            "Sale",
            DeliveryStatus::Returned,
            DeliveryStatus::Returned,
        ));
    }

    // Merge repeated detail ids, keeping first-seen order for the log
    let mut merged: Vec<(String, i64)> = Vec::new();
    for item in items {
        if item.quantity < 0 {
            return Err(CoreError::invalid_quantity(item.quantity, "must not be negative"));
        }
        if item.quantity == 0 {
            continue;
        }
        match merged.iter_mut().find(|(id, _)| *id == item.detail_id) {
            Some((_, qty)) => *qty += item.quantity,
            None => merged.push((item.detail_id.clone(), item.quantity)),
        }
    }
    if merged.is_empty() {
        return Err(CoreError::invalid_quantity(0, "nothing to return"));
    }

    let timestamp = now.format("%Y-%m-%d %H:%M:%S");
    let mut stock = data.batches.clone();
    let mut logs = sale.return_logs.clone().unwrap_or_default();
    let mut credit = Money::zero();

    for (detail_id, quantity) in &merged {
        let detail = data
            .sale_details
            .iter()
            .find(|d| d.id == *detail_id && d.sale_id == sale_id)
            .ok_or_else(|| CoreError::not_found("SaleDetail", detail_id))?;

        if *quantity > detail.quantity {
            return Err(CoreError::invalid_quantity(
                *quantity,
                format!("only {} units were sold on this line", detail.quantity),
            ));
        }

        restore_batch(&mut stock, &detail.batch_id, *quantity)?;

        let product_name = data
            .product(&detail.product_id)
            .map(|p| p.name.as_str())
            .unwrap_or(detail.product_id.as_str());
        let batch_code = stock
            .iter()
            .find(|b| b.id == detail.batch_id)
            .map(|b| b.batch_code.as_str())
            .unwrap_or(detail.batch_id.as_str());

        logs.push(format!(
            "{timestamp}: Restored {quantity} units of \"{product_name}\" to batch {batch_code}."
        ));
        credit += detail.unit_price.multiply_quantity(*quantity);
    }

    let reason = reason.trim();
    if !reason.is_empty() {
        logs.push(format!("{timestamp}: Reason: {reason}"));
    }

    let credited_customer = sale
        .is_outstanding_credit()
        .then(|| sale.customer_id.clone());

    data.batches = stock;
    let sale = data.sale_mut(sale_id)?;
    sale.return_logs = Some(logs);
    sale.delivery_status = DeliveryStatus::Returned;
    if credited_customer.is_some() {
        sale.returned_credit = Some(credit);
    }

    if let Some(customer_id) = credited_customer {
        if let Some(customer) = data.customers.iter_mut().find(|c| c.id == customer_id) {
            customer.current_balance = customer.current_balance.floor_sub(credit);
        }
    }

    Ok(credit)
}

// =============================================================================
// Queries
// =============================================================================

/// Sales whose calendar date (UTC) falls within `from..=to`, newest first.
pub fn list_sales(data: &Dataset, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Vec<&Sale> {
    let mut sales: Vec<&Sale> = data
        .sales
        .iter()
        .filter(|s| {
            let day = s.date.date_naive();
            from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
        })
        .collect();
    sales.sort_by(|a, b| b.date.cmp(&a.date));
    sales
}

/// The lines of one sale.
pub fn sale_details<'a>(data: &'a Dataset, sale_id: &str) -> CoreResult<Vec<&'a SaleDetail>> {
    let sale = data.sale(sale_id)?;
    Ok(data.details_for_sale(&sale.id).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::recompute_balances;
    use crate::seed;
    use crate::types::{Batch, BatchStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap()
    }

    fn balance(data: &Dataset, customer_id: &str) -> i64 {
        data.customer(customer_id).unwrap().current_balance.pesos()
    }

    fn qty(data: &Dataset, batch_id: &str) -> i64 {
        data.batch(batch_id).unwrap().current_qty
    }

    /// Seed data where b3 (expiry 2024-04-20, 12 units) holds p1 next to b1.
    fn fefo_dataset() -> Dataset {
        let mut data = seed::dataset();
        data.batches.retain(|b| b.id != "b3");
        data.batches.push(Batch {
            id: "b3".into(),
            product_id: "p1".into(),
            batch_code: "LOTE-003".into(),
            entry_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 4, 20).unwrap(),
            initial_qty: 30,
            current_qty: 12,
            reception_temp: -18.2,
            status: BatchStatus::Available,
        });
        data
    }

    fn credit_sale(data: &mut Dataset, customer: &str, product: &str, units: i64) -> Sale {
        let (sale, lines) = SaleDraft::new(customer, "admin", PaymentMethod::Credit)
            .line(product, units)
            .plan(data, now())
            .unwrap();
        create_sale(data, sale.clone(), lines).unwrap();
        sale
    }

    #[test]
    fn test_draft_allocates_fefo_and_totals() {
        let data = fefo_dataset();
        let (sale, lines) = SaleDraft::new("c2", "admin", PaymentMethod::Cash)
            .delivery_fee(Money::from_pesos(5000))
            .line("p1", 10)
            .plan(&data, now())
            .unwrap();

        assert_eq!(lines[0].batch_id, "b3");
        assert_eq!(sale.total.pesos(), 155000);
        assert_eq!(sale.payment_status, PaymentStatus::Pending);
        assert_eq!(sale.delivery_status, DeliveryStatus::InRoute);
    }

    #[test]
    fn test_draft_tracks_running_stock() {
        let data = fefo_dataset();
        let (_, lines) = SaleDraft::new("c2", "admin", PaymentMethod::Cash)
            .line("p1", 10)
            .line("p1", 10)
            .plan(&data, now())
            .unwrap();

        // b3 holds 12, so the second line must come from b1
        assert_eq!(lines[0].batch_id, "b3");
        assert_eq!(lines[1].batch_id, "b1");
    }

    #[test]
    fn test_field_origin_initial_status() {
        let data = seed::dataset();
        let (cash, _) = SaleDraft::new("c2", "seller-1", PaymentMethod::Transfer)
            .origin(DraftOrigin::Field)
            .line("p2", 1)
            .plan(&data, now())
            .unwrap();
        assert_eq!(cash.payment_status, PaymentStatus::Paid);

        let (credit, _) = SaleDraft::new("c2", "seller-1", PaymentMethod::Credit)
            .origin(DraftOrigin::Field)
            .line("p2", 1)
            .plan(&data, now())
            .unwrap();
        assert_eq!(credit.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_credit_sale_then_settle_on_delivery() {
        let mut data = seed::dataset();
        assert_eq!(balance(&data, "c1"), 50000);

        // 4 × 22000 + 12000 delivery = 100000
        let (sale, lines) = SaleDraft::new("c1", "admin", PaymentMethod::Credit)
            .delivery_fee(Money::from_pesos(12000))
            .line("p2", 4)
            .plan(&data, now())
            .unwrap();
        assert_eq!(sale.total.pesos(), 100000);
        create_sale(&mut data, sale.clone(), lines).unwrap();

        assert_eq!(balance(&data, "c1"), 150000);
        assert_eq!(qty(&data, "b2"), 36);
        assert_eq!(data.details_for_sale(&sale.id).count(), 1);

        let status = mark_delivered(&mut data, &sale.id, true).unwrap();
        assert_eq!(status, PaymentStatus::Paid);
        assert_eq!(balance(&data, "c1"), 50000);
        assert_eq!(data.sale(&sale.id).unwrap().delivery_status, DeliveryStatus::Delivered);
    }

    #[test]
    fn test_credit_delivery_without_settlement_stays_pending() {
        let mut data = seed::dataset();
        let sale = credit_sale(&mut data, "c2", "p1", 2);

        let status = mark_delivered(&mut data, &sale.id, false).unwrap();
        assert_eq!(status, PaymentStatus::Pending);
        assert_eq!(balance(&data, "c2"), 30000);
    }

    #[test]
    fn test_cash_delivery_is_paid_without_touching_balance() {
        let mut data = seed::dataset();
        let (sale, lines) = SaleDraft::new("c1", "admin", PaymentMethod::Cash)
            .line("p1", 1)
            .plan(&data, now())
            .unwrap();
        create_sale(&mut data, sale.clone(), lines).unwrap();
        assert_eq!(balance(&data, "c1"), 50000);

        mark_delivered(&mut data, &sale.id, false).unwrap();
        assert_eq!(data.sale(&sale.id).unwrap().payment_status, PaymentStatus::Paid);
        assert_eq!(balance(&data, "c1"), 50000);
    }

    #[test]
    fn test_credit_limit_is_enforced() {
        let mut data = seed::dataset();
        // c1: limit 200000, balance 50000; 10 × 16000 = 160000 would pass it
        let (sale, lines) = SaleDraft::new("c1", "admin", PaymentMethod::Credit)
            .line("p3", 10)
            .plan(&data, now())
            .unwrap();
        let before = data.clone();

        assert!(matches!(
            create_sale(&mut data, sale, lines),
            Err(CoreError::CreditLimitExceeded { .. })
        ));
        assert_eq!(data, before);
    }

    #[test]
    fn test_create_sale_is_all_or_nothing() {
        let mut data = seed::dataset();
        let sale = Sale {
            id: "s-x".into(),
            customer_id: "c2".into(),
            seller_id: "admin".into(),
            date: now(),
            total: Money::from_pesos(15000 * 5 + 16000 * 13),
            delivery_fee: None,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::InRoute,
            return_logs: None,
            returned_credit: None,
        };
        let lines = vec![
            LineItem {
                product_id: "p1".into(),
                batch_id: "b1".into(),
                quantity: 5,
                unit_price: Money::from_pesos(15000),
            },
            LineItem {
                product_id: "p3".into(),
                batch_id: "b3".into(),
                quantity: 13,
                unit_price: Money::from_pesos(16000),
            },
        ];
        let before = data.clone();

        assert!(matches!(
            create_sale(&mut data, sale, lines),
            Err(CoreError::InsufficientStock { available: 12, .. })
        ));
        assert_eq!(data, before);
    }

    #[test]
    fn test_new_sale_must_start_open() {
        let mut data = seed::dataset();
        let (sale, lines) = SaleDraft::new("c2", "admin", PaymentMethod::Credit)
            .line("p1", 1)
            .plan(&data, now())
            .unwrap();
        let before = data.clone();

        let mut settled = sale.clone();
        settled.payment_status = PaymentStatus::Paid;
        assert!(matches!(
            create_sale(&mut data, settled, lines.clone()),
            Err(CoreError::InvalidTransition { .. })
        ));

        for delivery in [DeliveryStatus::Returned, DeliveryStatus::Delivered] {
            let mut closed = sale.clone();
            closed.delivery_status = delivery;
            assert!(matches!(
                create_sale(&mut data, closed, lines.clone()),
                Err(CoreError::InvalidTransition { .. })
            ));
        }

        let mut with_history = sale.clone();
        with_history.returned_credit = Some(Money::from_pesos(15000));
        assert!(matches!(
            create_sale(&mut data, with_history, lines.clone()),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(data, before);

        let mut from_warehouse = sale;
        from_warehouse.delivery_status = DeliveryStatus::Warehouse;
        create_sale(&mut data, from_warehouse, lines).unwrap();
        assert_eq!(
            data.customer("c2").unwrap().current_balance,
            crate::ledger::expected_balance(&data, "c2")
        );
    }

    #[test]
    fn test_cash_sale_for_customer_over_limit() {
        let mut data = seed::dataset();
        data.customer_mut("c1").unwrap().current_balance = Money::from_pesos(250000);

        let (sale, lines) = SaleDraft::new("c1", "seller-1", PaymentMethod::Cash)
            .origin(DraftOrigin::Field)
            .line("p1", 1)
            .plan(&data, now())
            .unwrap();
        assert_eq!(sale.payment_status, PaymentStatus::Paid);
        create_sale(&mut data, sale, lines).unwrap();
        assert_eq!(balance(&data, "c1"), 250000);
    }

    #[test]
    fn test_oversized_price_is_rejected() {
        let mut data = seed::dataset();
        data.products[0].sale_price = Money::from_pesos(i64::MAX / 2);

        let result = SaleDraft::new("c2", "admin", PaymentMethod::Credit)
            .line("p1", 3)
            .plan(&data, now());
        assert!(matches!(result, Err(CoreError::Validation(_))));

        let sale = Sale {
            id: "s-big".into(),
            customer_id: "c2".into(),
            seller_id: "admin".into(),
            date: now(),
            total: Money::from_pesos(i64::MAX),
            delivery_fee: None,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::InRoute,
            return_logs: None,
            returned_credit: None,
        };
        let lines = vec![LineItem {
            product_id: "p1".into(),
            batch_id: "b1".into(),
            quantity: 3,
            unit_price: Money::from_pesos(i64::MAX / 2),
        }];
        let before = data.clone();
        assert!(matches!(
            create_sale(&mut data, sale, lines),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(data, before);
    }

    #[test]
    fn test_create_sale_rejects_unknown_customer_and_bad_total() {
        let mut data = seed::dataset();
        let (mut sale, lines) = SaleDraft::new("c2", "admin", PaymentMethod::Cash)
            .line("p1", 1)
            .plan(&data, now())
            .unwrap();

        sale.total = Money::from_pesos(1);
        assert!(create_sale(&mut data, sale.clone(), lines.clone()).is_err());

        sale.total = Money::from_pesos(15000);
        sale.customer_id = "ghost".into();
        assert!(create_sale(&mut data, sale, lines).unwrap_err().is_not_found());
    }

    #[test]
    fn test_paid_to_pending_is_rejected() {
        let mut data = seed::dataset();
        let sale = credit_sale(&mut data, "c2", "p1", 1);
        mark_delivered(&mut data, &sale.id, true).unwrap();

        let result = update_sale(
            &mut data,
            &sale.id,
            SaleUpdate {
                payment_status: Some(PaymentStatus::Pending),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(CoreError::InvalidTransition { .. })));
    }

    #[test]
    fn test_delivered_is_terminal_for_delivery() {
        let mut data = seed::dataset();
        let sale = credit_sale(&mut data, "c2", "p1", 1);
        mark_delivered(&mut data, &sale.id, false).unwrap();

        let back = update_sale(
            &mut data,
            &sale.id,
            SaleUpdate {
                delivery_status: Some(DeliveryStatus::InRoute),
                ..Default::default()
            },
        );
        assert!(back.is_err());

        // Settling later is still allowed
        update_sale(
            &mut data,
            &sale.id,
            SaleUpdate {
                payment_status: Some(PaymentStatus::Paid),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(balance(&data, "c2"), 0);
    }

    #[test]
    fn test_partial_return_credits_balance_and_restores_stock() {
        let mut data = seed::dataset();
        data.customer_mut("c2").unwrap().current_balance = Money::zero();

        // 10 × 15000 = 150000 on credit
        let sale = credit_sale(&mut data, "c2", "p1", 10);
        assert_eq!(balance(&data, "c2"), 150000);
        assert_eq!(qty(&data, "b1"), 75);

        let detail_id = data.details_for_sale(&sale.id).next().unwrap().id.clone();
        let credit = process_return(
            &mut data,
            &sale.id,
            &[ReturnItem {
                detail_id,
                quantity: 5,
            }],
            "Broken cold chain",
            now(),
        )
        .unwrap();

        assert_eq!(credit.pesos(), 75000);
        assert_eq!(balance(&data, "c2"), 75000);
        assert_eq!(qty(&data, "b1"), 80);

        let returned = data.sale(&sale.id).unwrap();
        assert_eq!(returned.delivery_status, DeliveryStatus::Returned);
        assert_eq!(returned.returned_credit, Some(Money::from_pesos(75000)));
        let logs = returned.return_logs.as_ref().unwrap();
        assert_eq!(
            logs[0],
            "2024-05-01 14:30:00: Restored 5 units of \"Empanada de Carne x 10\" to batch LOTE-001."
        );
        assert_eq!(logs[1], "2024-05-01 14:30:00: Reason: Broken cold chain");
    }

    #[test]
    fn test_partial_return_survives_recompute() {
        let mut data = seed::dataset();
        recompute_balances(&mut data);

        let sale = credit_sale(&mut data, "c2", "p1", 10);
        let detail_id = data.details_for_sale(&sale.id).next().unwrap().id.clone();
        process_return(
            &mut data,
            &sale.id,
            &[ReturnItem {
                detail_id,
                quantity: 5,
            }],
            "",
            now(),
        )
        .unwrap();
        assert_eq!(balance(&data, "c2"), 75000);

        let corrections = recompute_balances(&mut data);
        assert!(corrections.is_empty());
        assert_eq!(balance(&data, "c2"), 75000);
    }

    #[test]
    fn test_full_return_keeps_delivery_fee_owed() {
        let mut data = seed::dataset();
        recompute_balances(&mut data);

        let (sale, lines) = SaleDraft::new("c2", "admin", PaymentMethod::Credit)
            .delivery_fee(Money::from_pesos(5000))
            .line("p2", 2)
            .plan(&data, now())
            .unwrap();
        create_sale(&mut data, sale.clone(), lines).unwrap();
        assert_eq!(balance(&data, "c2"), 49000);

        let items: Vec<ReturnItem> = data
            .details_for_sale(&sale.id)
            .map(|d| ReturnItem {
                detail_id: d.id.clone(),
                quantity: d.quantity,
            })
            .collect();
        process_return(&mut data, &sale.id, &items, "", now()).unwrap();
        assert_eq!(balance(&data, "c2"), 5000);

        assert!(recompute_balances(&mut data).is_empty());
        assert_eq!(balance(&data, "c2"), 5000);
    }

    #[test]
    fn test_full_return_conserves_stock_and_balance() {
        let mut data = seed::dataset();
        let balance_before = balance(&data, "c3");
        let stock_before = qty(&data, "b2");

        let sale = credit_sale(&mut data, "c3", "p2", 7);
        let items: Vec<ReturnItem> = data
            .details_for_sale(&sale.id)
            .map(|d| ReturnItem {
                detail_id: d.id.clone(),
                quantity: d.quantity,
            })
            .collect();
        process_return(&mut data, &sale.id, &items, "", now()).unwrap();

        assert_eq!(qty(&data, "b2"), stock_before);
        assert_eq!(balance(&data, "c3"), balance_before);
    }

    #[test]
    fn test_return_validation() {
        let mut data = seed::dataset();
        let sale = credit_sale(&mut data, "c2", "p1", 3);
        let detail_id = data.details_for_sale(&sale.id).next().unwrap().id.clone();
        let before = data.clone();

        let too_many = [
            ReturnItem {
                detail_id: detail_id.clone(),
                quantity: 2,
            },
            ReturnItem {
                detail_id: detail_id.clone(),
                quantity: 2,
            },
        ];
        assert!(matches!(
            process_return(&mut data, &sale.id, &too_many, "", now()),
            Err(CoreError::InvalidQuantity { .. })
        ));

        let negative = [ReturnItem {
            detail_id: detail_id.clone(),
            quantity: -1,
        }];
        assert!(process_return(&mut data, &sale.id, &negative, "", now()).is_err());

        let empty = [ReturnItem {
            detail_id: detail_id.clone(),
            quantity: 0,
        }];
        assert!(process_return(&mut data, &sale.id, &empty, "", now()).is_err());

        let foreign = [ReturnItem {
            detail_id: "not-a-detail".into(),
            quantity: 1,
        }];
        let err = process_return(&mut data, &sale.id, &foreign, "", now()).unwrap_err();
        assert_eq!(err.to_string(), "SaleDetail not found: not-a-detail");

        assert_eq!(data, before);

        let one = [ReturnItem {
            detail_id,
            quantity: 1,
        }];
        process_return(&mut data, &sale.id, &one, "", now()).unwrap();
        assert!(matches!(
            process_return(&mut data, &sale.id, &one, "", now()),
            Err(CoreError::InvalidTransition { .. })
        ));
        assert!(update_sale(&mut data, &sale.id, SaleUpdate::default()).is_err());
    }

    #[test]
    fn test_cash_return_leaves_balance_alone() {
        let mut data = seed::dataset();
        let (sale, lines) = SaleDraft::new("c3", "admin", PaymentMethod::Cash)
            .line("p1", 2)
            .plan(&data, now())
            .unwrap();
        create_sale(&mut data, sale.clone(), lines).unwrap();

        let detail_id = data.details_for_sale(&sale.id).next().unwrap().id.clone();
        process_return(
            &mut data,
            &sale.id,
            &[ReturnItem {
                detail_id,
                quantity: 2,
            }],
            "",
            now(),
        )
        .unwrap();
        assert_eq!(balance(&data, "c3"), 320000);
    }

    #[test]
    fn test_balances_match_recompute_after_mixed_history() {
        let mut data = seed::dataset();
        recompute_balances(&mut data);

        let a = credit_sale(&mut data, "c1", "p1", 4);
        let b = credit_sale(&mut data, "c1", "p2", 2);
        let c = credit_sale(&mut data, "c3", "p3", 5);
        mark_delivered(&mut data, &a.id, true).unwrap();
        mark_delivered(&mut data, &b.id, false).unwrap();

        let items: Vec<ReturnItem> = data
            .details_for_sale(&c.id)
            .map(|d| ReturnItem {
                detail_id: d.id.clone(),
                quantity: d.quantity,
            })
            .collect();
        process_return(&mut data, &c.id, &items, "", now()).unwrap();

        let incremental = data.customers.clone();
        let corrections = recompute_balances(&mut data);
        assert!(corrections.is_empty());
        assert_eq!(data.customers, incremental);
        assert_eq!(balance(&data, "c1"), 44000);
    }

    #[test]
    fn test_list_sales_filters_and_orders() {
        let mut data = seed::dataset();
        for (day, units) in [(1, 1), (3, 1), (2, 1)] {
            let at = Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap();
            let (sale, lines) = SaleDraft::new("c2", "admin", PaymentMethod::Cash)
                .line("p1", units)
                .plan(&data, at)
                .unwrap();
            create_sale(&mut data, sale, lines).unwrap();
        }

        let all = list_sales(&data, None, None);
        assert_eq!(all.len(), 3);
        assert!(all[0].date > all[1].date && all[1].date > all[2].date);

        let from = NaiveDate::from_ymd_opt(2024, 6, 2);
        let ranged = list_sales(&data, from, from);
        assert_eq!(ranged.len(), 1);

        assert_eq!(sale_details(&data, &all[0].id).unwrap().len(), 1);
        assert!(sale_details(&data, "ghost").is_err());
    }
}
