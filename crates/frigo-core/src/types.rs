//! # Domain Types
//!
//! Entities shared by every FrigoGest component.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────────────┐     │
//! │  │   Category    │◄──│    Product    │◄──│        Batch          │     │
//! │  │  id, name     │   │  category_id  │   │  product_id (hard)    │     │
//! │  └───────────────┘   │  (soft ref)   │   │  expiry_date          │     │
//! │                      │  prices       │   │  initial/current_qty  │     │
//! │                      └───────────────┘   └──────────▲────────────┘     │
//! │                                                     │ batch_id         │
//! │  ┌───────────────┐   ┌───────────────┐   ┌──────────┴────────────┐     │
//! │  │   Customer    │◄──│     Sale      │◄──│      SaleDetail       │     │
//! │  │ credit_limit  │   │ payment_*     │   │  quantity, unit_price │     │
//! │  │ balance       │   │ delivery_*    │   │  (immutable)          │     │
//! │  └───────────────┘   └───────────────┘   └───────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Field Naming
//! Every entity serializes in camelCase (`categoryId`, `currentQty`) so the
//! stored collections and the replication payload keep one JSON shape.
//!
//! ## Status Machines
//! [`BatchStatus`], [`PaymentStatus`] and [`DeliveryStatus`] are closed
//! enums. The allowed moves live in `can_transition_to`, which the sales
//! engine consults before touching a sale.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product family (Empanadas, Deditos, Papas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

// =============================================================================
// Product
// =============================================================================

/// A sellable frozen product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Soft reference to a [`Category`]; not validated on delete.
    pub category_id: String,

    /// Display name ("Empanada de Carne x 10").
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Purchase cost per unit.
    pub cost_price: Money,

    /// Price charged per unit.
    pub sale_price: Money,

    /// Stock level below which the product is reported as low.
    pub min_stock: i64,

    /// Packaging unit ("Caja", "Bolsa", "Unidad").
    pub unit: String,

    /// Shelf life used to default a new batch's expiry date.
    pub shelf_life_days: i64,
}

impl Product {
    /// Returns true when `stock` is under this product's minimum.
    #[inline]
    pub fn is_below_min(&self, stock: i64) -> bool {
        stock < self.min_stock
    }
}

// =============================================================================
// Batch
// =============================================================================

/// Quality status of a physical batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum BatchStatus {
    /// Released for sale; the only status FEFO allocates from.
    #[default]
    Available,
    /// Held back (temperature excursion, inspection).
    Quarantine,
    /// Past its expiry date.
    Expired,
}

impl BatchStatus {
    /// Returns true when FEFO may allocate from a batch in this status.
    #[inline]
    pub fn is_allocatable(&self) -> bool {
        matches!(self, BatchStatus::Available)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Available => write!(f, "Available"),
            BatchStatus::Quarantine => write!(f, "Quarantine"),
            BatchStatus::Expired => write!(f, "Expired"),
        }
    }
}

/// A traceable lot of one product received together.
///
/// ## Invariant
/// `0 <= current_qty <= initial_qty`. Only the inventory ledger mutates
/// `current_qty` (decrement on sale, restore on return).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,

    /// Hard reference: deleting the product deletes this batch.
    pub product_id: String,

    /// Human lot code ("LOTE-001").
    pub batch_code: String,

    #[ts(as = "String")]
    pub entry_date: NaiveDate,

    #[ts(as = "String")]
    pub expiry_date: NaiveDate,

    pub initial_qty: i64,

    pub current_qty: i64,

    /// Temperature at reception, °C.
    pub reception_temp: f64,

    pub status: BatchStatus,
}

impl Batch {
    /// Days from `today` until expiry (negative once expired).
    #[inline]
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    /// Returns true when the batch expired before `today`.
    #[inline]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Units a return can still put back before hitting `initial_qty`.
    #[inline]
    pub fn restore_headroom(&self) -> i64 {
        self.initial_qty - self.current_qty
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Geographic position of a customer's drop-off point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// The distribution centre in Barranquilla, used when a customer is
    /// registered without coordinates.
    pub const DEPOT: Coordinates = Coordinates {
        lat: 10.963,
        lng: -74.796,
    };
}

impl Default for Coordinates {
    fn default() -> Self {
        Coordinates::DEPOT
    }
}

/// A shop or restaurant the distributor delivers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub business_name: String,
    pub contact_person: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub coordinates: Coordinates,

    /// Maximum outstanding credit allowed.
    pub credit_limit: Money,

    /// Derived: sum of unpaid, non-returned credit sales, net of return
    /// credits. Rebuilt from history by `recompute_balances`.
    pub current_balance: Money,

    /// Route day, 1 (Monday) to 7 (Sunday).
    pub visit_day: u8,
}

impl Customer {
    /// Credit still available before the limit is reached.
    #[inline]
    pub fn available_credit(&self) -> Money {
        self.credit_limit.floor_sub(self.current_balance)
    }
}

// =============================================================================
// Payment Method / Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Transfer,
    /// Deferred payment tracked against the customer's balance.
    Credit,
}

impl PaymentMethod {
    #[inline]
    pub fn is_credit(&self) -> bool {
        matches!(self, PaymentMethod::Credit)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Transfer => write!(f, "Transfer"),
            PaymentMethod::Credit => write!(f, "Credit"),
        }
    }
}

/// Whether a sale has been paid.
///
/// ## Transitions
/// ```text
///   Pending ──► Paid        (settles; credit balance drops by total)
///   Paid    ──► Pending     ✗ rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentStatus {
    Paid,
    Pending,
}

impl PaymentStatus {
    /// Returns true when moving to `next` is allowed (same state included).
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, _) | (PaymentStatus::Paid, PaymentStatus::Paid)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Pending => write!(f, "Pending"),
        }
    }
}

// =============================================================================
// Delivery Status
// =============================================================================

/// Where a sale's goods are.
///
/// ## Transitions
/// ```text
///   Warehouse ──► In Route ──► Delivered (terminal)
///       │   ◄────────┘
///       └────────────────────► Delivered
///
///   any non-terminal ──(process_return only)──► Returned (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DeliveryStatus {
    Warehouse,
    #[serde(rename = "In Route")]
    InRoute,
    Delivered,
    Returned,
}

impl DeliveryStatus {
    /// Returns true for states no update can leave.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Returned)
    }

    /// Transition table for plain status updates.
    ///
    /// `Returned` is never reachable here; it is set by the return flow,
    /// which also restores stock and credits the customer.
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        match (self, next) {
            (current, next) if *current == next => true,
            (_, Returned) => false,
            (Warehouse, InRoute) | (Warehouse, Delivered) => true,
            (InRoute, Warehouse) | (InRoute, Delivered) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Warehouse => write!(f, "Warehouse"),
            DeliveryStatus::InRoute => write!(f, "In Route"),
            DeliveryStatus::Delivered => write!(f, "Delivered"),
            DeliveryStatus::Returned => write!(f, "Returned"),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// An order placed by a customer.
///
/// Owns its [`SaleDetail`] rows; both are created in one commit together
/// with the batch decrements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    pub seller_id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    /// Σ line subtotals + delivery fee.
    pub total: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<Money>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    /// Human-readable, timestamped return trail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_logs: Option<Vec<String>>,
    /// Credit taken off the customer's balance by a return on this sale.
    /// Only set when the sale was outstanding credit at return time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returned_credit: Option<Money>,
}

impl Sale {
    /// Returns true while the whole total counts toward the customer's
    /// balance: Credit, still Pending, and not Returned.
    #[inline]
    pub fn is_outstanding_credit(&self) -> bool {
        self.payment_method.is_credit()
            && self.payment_status == PaymentStatus::Pending
            && self.delivery_status != DeliveryStatus::Returned
    }

    /// What this sale still adds to the customer's balance.
    ///
    /// ```text
    ///   Credit + Pending, not Returned      total
    ///   Credit + Pending, Returned          total − returned_credit (≥ 0)
    ///   Returned without returned_credit    0
    ///   anything else                       0
    /// ```
    ///
    /// A Returned sale without `returned_credit` predates the field or was
    /// never outstanding, and counts as fully returned.
    pub fn outstanding_credit(&self) -> Money {
        if !self.payment_method.is_credit() || self.payment_status != PaymentStatus::Pending {
            return Money::zero();
        }
        match (self.delivery_status, self.returned_credit) {
            (DeliveryStatus::Returned, Some(credit)) => self.total.floor_sub(credit),
            (DeliveryStatus::Returned, None) => Money::zero(),
            _ => self.total,
        }
    }
}

// =============================================================================
// Sale Detail
// =============================================================================

/// One line of a sale, bound to the batch it consumed. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub batch_id: String,
    pub quantity: i64,
    /// Price per unit frozen at sale time.
    pub unit_price: Money,
    pub subtotal: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Pending));
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Paid));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Pending));
    }

    #[test]
    fn test_delivery_transitions() {
        use DeliveryStatus::*;
        assert!(Warehouse.can_transition_to(InRoute));
        assert!(InRoute.can_transition_to(Delivered));
        assert!(InRoute.can_transition_to(Warehouse));
        assert!(!Delivered.can_transition_to(InRoute));
        assert!(!InRoute.can_transition_to(Returned));
        assert!(!Returned.can_transition_to(Delivered));
        assert!(Delivered.is_terminal());
        assert!(!Warehouse.is_terminal());
    }

    #[test]
    fn test_delivery_status_wire_names() {
        let json = serde_json::to_string(&DeliveryStatus::InRoute).unwrap();
        assert_eq!(json, "\"In Route\"");
        let parsed: DeliveryStatus = serde_json::from_str("\"Returned\"").unwrap();
        assert_eq!(parsed, DeliveryStatus::Returned);
    }

    #[test]
    fn test_batch_parses_source_shape() {
        let json = r#"{
            "id": "b3", "productId": "p3", "batchCode": "LOTE-003",
            "entryDate": "2024-04-01", "expiryDate": "2024-04-20",
            "initialQty": 30, "currentQty": 12, "receptionTemp": -18.2,
            "status": "Available"
        }"#;
        let batch: Batch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.current_qty, 12);
        assert_eq!(batch.restore_headroom(), 18);

        let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        assert_eq!(batch.days_until_expiry(today), 10);
        assert!(!batch.is_expired(today));
    }

    #[test]
    fn test_sale_optional_fields_round_trip_absent() {
        let json = r#"{
            "id": "s1", "customerId": "c1", "sellerId": "admin",
            "date": "2024-05-01T14:30:00.000Z", "total": 100000,
            "paymentMethod": "Credit", "paymentStatus": "Pending",
            "deliveryStatus": "In Route"
        }"#;
        let sale: Sale = serde_json::from_str(json).unwrap();
        assert!(sale.delivery_fee.is_none());
        assert!(sale.is_outstanding_credit());

        let out = serde_json::to_value(&sale).unwrap();
        assert!(out.get("returnLogs").is_none());
        assert!(out.get("returnedCredit").is_none());
        assert_eq!(out["deliveryStatus"], "In Route");
    }

    #[test]
    fn test_outstanding_credit_nets_returns() {
        let json = r#"{
            "id": "s1", "customerId": "c2", "sellerId": "admin",
            "date": "2024-05-01T14:30:00.000Z", "total": 150000,
            "paymentMethod": "Credit", "paymentStatus": "Pending",
            "deliveryStatus": "In Route"
        }"#;
        let mut sale: Sale = serde_json::from_str(json).unwrap();
        assert_eq!(sale.outstanding_credit(), Money::from_pesos(150000));

        sale.delivery_status = DeliveryStatus::Returned;
        assert_eq!(sale.outstanding_credit(), Money::zero());

        sale.returned_credit = Some(Money::from_pesos(75000));
        assert_eq!(sale.outstanding_credit(), Money::from_pesos(75000));
        assert!(!sale.is_outstanding_credit());

        sale.payment_status = PaymentStatus::Paid;
        assert_eq!(sale.outstanding_credit(), Money::zero());

        sale.payment_status = PaymentStatus::Pending;
        sale.payment_method = PaymentMethod::Cash;
        assert_eq!(sale.outstanding_credit(), Money::zero());
    }

    #[test]
    fn test_available_credit() {
        let customer = Customer {
            id: "c1".into(),
            business_name: "Tienda".into(),
            contact_person: "Marta".into(),
            phone: "3101234567".into(),
            address: "Calle 10".into(),
            city: "Barranquilla".into(),
            coordinates: Coordinates::DEPOT,
            credit_limit: Money::from_pesos(200000),
            current_balance: Money::from_pesos(50000),
            visit_day: 1,
        };
        assert_eq!(customer.available_credit(), Money::from_pesos(150000));
    }
}
