//! # Money Module
//!
//! Provides the `Money` type for peso amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PESO AMOUNTS ARE WHOLE NUMBERS                                         │
//! │                                                                         │
//! │  Prices, delivery fees, credit limits and balances are all quoted in   │
//! │  whole Colombian pesos (15000, 150000, 1500000).                       │
//! │                                                                         │
//! │  In floating point a balance replayed from hundreds of sales drifts:   │
//! │    0.1 + 0.2 = 0.30000000000000004                                     │
//! │                                                                         │
//! │  OUR SOLUTION: i64 pesos                                               │
//! │    recompute_balances() yields exactly what the incremental updates    │
//! │    produced, so the two can be compared with ==                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! `Money` serializes as a bare JSON number, so stored and replicated
//! collections stay `{"salePrice": 15000}`.
//!
//! ## Usage
//! ```rust
//! use frigo_core::money::Money;
//!
//! let price = Money::from_pesos(15000);
//! let line = price * 10;
//! assert_eq!(line.pesos(), 150000);
//!
//! // Balances never go below zero
//! let balance = Money::from_pesos(50000).floor_sub(Money::from_pesos(80000));
//! assert!(balance.is_zero());
//! ```
//!
//! ## Overflow
//! The operators saturate at the `i64` bounds instead of panicking, since
//! replicated collections can carry any number. Code that computes a total
//! it is about to store uses [`Money::checked_add`] and
//! [`Money::checked_mul_quantity`] and rejects the input on `None`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole pesos.
///
/// ## Where Money is Used
/// ```text
/// Product.sale_price ──► SaleDetail.unit_price ──► SaleDetail.subtotal
///                                                        │
///                         Sale.delivery_fee ─────────────┤
///                                                        ▼
///                                                   Sale.total
///                                                        │
///                    (Credit sales only)                 ▼
///                                          Customer.current_balance
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole pesos.
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos)
    }

    /// Returns the value in pesos.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Subtracts `other`, flooring the result at zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Balance: $50.000      Return credit: $80.000
    ///      │                      │
    ///      └──── floor_sub ◄──────┘   ← THIS FUNCTION
    ///               │
    ///               ▼
    ///        Balance: $0 (never negative)
    /// ```
    #[inline]
    pub const fn floor_sub(&self, other: Money) -> Self {
        let result = self.0.saturating_sub(other.0);
        if result < 0 {
            Money(0)
        } else {
            Money(result)
        }
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use frigo_core::money::Money;
    ///
    /// let unit_price = Money::from_pesos(22000);
    /// assert_eq!(unit_price.multiply_quantity(3).pesos(), 66000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `self × qty`, or `None` on overflow.
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays pesos with `.` as the thousands separator: `$150.000`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}${}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_pesos(0).to_string(), "$0");
        assert_eq!(Money::from_pesos(950).to_string(), "$950");
        assert_eq!(Money::from_pesos(15000).to_string(), "$15.000");
        assert_eq!(Money::from_pesos(1500000).to_string(), "$1.500.000");
        assert_eq!(Money::from_pesos(-75000).to_string(), "-$75.000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_pesos(100000);
        let b = Money::from_pesos(50000);

        assert_eq!((a + b).pesos(), 150000);
        assert_eq!((a - b).pesos(), 50000);
        assert_eq!((b * 3).pesos(), 150000);

        let total: Money = vec![a, b, Money::from_pesos(5000)].into_iter().sum();
        assert_eq!(total.pesos(), 155000);
    }

    #[test]
    fn test_overflow_saturates_or_reports() {
        let huge = Money::from_pesos(i64::MAX / 2);

        assert_eq!(huge * 3, Money::from_pesos(i64::MAX));
        assert_eq!(huge.multiply_quantity(3), Money::from_pesos(i64::MAX));
        assert_eq!(huge + huge + huge, Money::from_pesos(i64::MAX));
        assert_eq!(Money::from_pesos(i64::MIN) - huge, Money::from_pesos(i64::MIN));
        let total: Money = vec![huge, huge, huge].into_iter().sum();
        assert_eq!(total, Money::from_pesos(i64::MAX));

        assert_eq!(huge.checked_mul_quantity(3), None);
        assert_eq!(huge.checked_add(huge.checked_mul_quantity(2).unwrap()), None);
        assert_eq!(
            Money::from_pesos(15000).checked_mul_quantity(3),
            Some(Money::from_pesos(45000))
        );
        assert_eq!(
            Money::from_pesos(15000).checked_add(Money::from_pesos(5000)),
            Some(Money::from_pesos(20000))
        );
    }

    #[test]
    fn test_floor_sub() {
        let balance = Money::from_pesos(150000);
        assert_eq!(balance.floor_sub(Money::from_pesos(75000)).pesos(), 75000);
        assert_eq!(balance.floor_sub(Money::from_pesos(200000)), Money::zero());
    }

    #[test]
    fn test_serializes_as_bare_number() {
        let json = serde_json::to_string(&Money::from_pesos(22000)).unwrap();
        assert_eq!(json, "22000");

        let back: Money = serde_json::from_str("16000").unwrap();
        assert_eq!(back, Money::from_pesos(16000));
    }
}
