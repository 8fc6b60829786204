//! # Seed Data
//!
//! The catalog, stock and customers a fresh store starts with.
//!
//! Sales and sale details start empty. The storage layer writes these
//! collections only where a key is missing, so a store that already holds
//! data is never overwritten by `init`.
//!
//! Customers `c1` (50 000) and `c3` (320 000) open with a balance that no
//! seed sale backs, so the first `frigogest repair` resets both to 0.

use chrono::NaiveDate;

use crate::dataset::Dataset;
use crate::money::Money;
use crate::types::{Batch, BatchStatus, Category, Coordinates, Customer, Product};

/// Default categories: `1` Empanadas, `2` Deditos, `3` Papas.
pub fn categories() -> Vec<Category> {
    vec![
        category("1", "Empanadas", "Empanadas listas para freir"),
        category("2", "Deditos", "Deditos de queso y bocadillo"),
        category("3", "Papas", "Papas precocidas congeladas"),
    ]
}

/// Default products `p1`..`p3`.
pub fn products() -> Vec<Product> {
    vec![
        product("p1", "1", "Empanada de Carne x 10", "Caja de 10 unidades", 8000, 15000, 20, "Caja", 90),
        product("p2", "2", "Dedito de Queso x 20", "Bolsa de 20 unidades", 12000, 22000, 15, "Bolsa", 120),
        product("p3", "1", "Empanada de Pollo x 10", "Caja de 10 unidades", 8500, 16000, 20, "Caja", 90),
    ]
}

/// Default batches `b1`..`b3`, one per seed product.
pub fn batches() -> Vec<Batch> {
    vec![
        batch("b1", "p1", "LOTE-001", (2024, 3, 1), (2025, 6, 1), 100, 85, -18.5),
        batch("b2", "p2", "LOTE-002", (2024, 3, 5), (2025, 7, 5), 50, 40, -19.0),
        batch("b3", "p3", "LOTE-003", (2024, 4, 1), (2024, 4, 20), 30, 12, -18.2),
    ]
}

/// Default customers `c1`..`c3`.
///
/// The opening balances of `c1` and `c3` are not backed by sales.
pub fn customers() -> Vec<Customer> {
    vec![
        Customer {
            id: "c1".to_string(),
            business_name: "Tienda La Bendición".to_string(),
            contact_person: "Marta Lucia".to_string(),
            phone: "3101234567".to_string(),
            address: "Calle 10 # 5-20".to_string(),
            city: "Barranquilla".to_string(),
            coordinates: Coordinates::DEPOT,
            credit_limit: Money::from_pesos(200000),
            current_balance: Money::from_pesos(50000),
            visit_day: 1,
        },
        Customer {
            id: "c2".to_string(),
            business_name: "Restaurante El Paisa".to_string(),
            contact_person: "Juan Carlos".to_string(),
            phone: "3209876543".to_string(),
            address: "Cra 43 # 80-10".to_string(),
            city: "Barranquilla".to_string(),
            coordinates: Coordinates {
                lat: 11.002,
                lng: -74.808,
            },
            credit_limit: Money::from_pesos(500000),
            current_balance: Money::zero(),
            visit_day: 2,
        },
        Customer {
            id: "c3".to_string(),
            business_name: "Supermercado 24/7".to_string(),
            contact_person: "Elena Rivas".to_string(),
            phone: "3004445566".to_string(),
            address: "Cl. 72 #46-32".to_string(),
            city: "Barranquilla".to_string(),
            coordinates: Coordinates {
                lat: 10.995,
                lng: -74.815,
            },
            credit_limit: Money::from_pesos(1500000),
            current_balance: Money::from_pesos(320000),
            visit_day: 1,
        },
    ]
}

/// The complete seed dataset.
pub fn dataset() -> Dataset {
    Dataset {
        categories: categories(),
        products: products(),
        batches: batches(),
        customers: customers(),
        sales: Vec::new(),
        sale_details: Vec::new(),
    }
}

/// Re-adds seed products and customers whose ids are missing.
///
/// Used by the partial reset: records the user created or edited stay as
/// they are. Returns how many records were added.
pub fn restore_missing(data: &mut Dataset) -> usize {
    let mut added = 0;

    for product in products() {
        if !data.products.iter().any(|p| p.id == product.id) {
            data.products.push(product);
            added += 1;
        }
    }

    for customer in customers() {
        if !data.customers.iter().any(|c| c.id == customer.id) {
            data.customers.push(customer);
            added += 1;
        }
    }

    added
}

// =============================================================================
// Builders
// =============================================================================

fn category(id: &str, name: &str, description: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: &str,
    category_id: &str,
    name: &str,
    description: &str,
    cost: i64,
    sale: i64,
    min_stock: i64,
    unit: &str,
    shelf_life_days: i64,
) -> Product {
    Product {
        id: id.to_string(),
        category_id: category_id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        cost_price: Money::from_pesos(cost),
        sale_price: Money::from_pesos(sale),
        min_stock,
        unit: unit.to_string(),
        shelf_life_days,
    }
}

#[allow(clippy::too_many_arguments)]
fn batch(
    id: &str,
    product_id: &str,
    code: &str,
    entry: (i32, u32, u32),
    expiry: (i32, u32, u32),
    initial_qty: i64,
    current_qty: i64,
    temp: f64,
) -> Batch {
    Batch {
        id: id.to_string(),
        product_id: product_id.to_string(),
        batch_code: code.to_string(),
        entry_date: ymd(entry),
        expiry_date: ymd(expiry),
        initial_qty,
        current_qty,
        reception_temp: temp,
        status: BatchStatus::Available,
    }
}

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_shape() {
        let data = dataset();
        assert_eq!(data.categories.len(), 3);
        assert_eq!(data.products.len(), 3);
        assert_eq!(data.batches.len(), 3);
        assert_eq!(data.customers.len(), 3);
        assert!(data.sales.is_empty());

        let b3 = data.batch("b3").unwrap();
        assert_eq!(b3.expiry_date, NaiveDate::from_ymd_opt(2024, 4, 20).unwrap());
        assert_eq!(b3.current_qty, 12);
    }

    #[test]
    fn test_restore_missing_only_adds_absent_ids() {
        let mut data = dataset();
        data.products.retain(|p| p.id != "p2");
        data.customers[0].current_balance = Money::from_pesos(99);

        assert_eq!(restore_missing(&mut data), 1);
        assert!(data.product("p2").is_ok());
        assert_eq!(data.customers[0].current_balance, Money::from_pesos(99));
        assert_eq!(restore_missing(&mut data), 0);
    }

    #[test]
    fn test_opening_balances_reset_on_first_repair() {
        let mut data = dataset();

        let corrections = crate::ledger::recompute_balances(&mut data);
        let ids: Vec<&str> = corrections.iter().map(|c| c.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c3"]);
        assert_eq!(corrections[0].previous, Money::from_pesos(50000));
        assert_eq!(corrections[1].previous, Money::from_pesos(320000));
        assert!(data.customers.iter().all(|c| c.current_balance == Money::zero()));
    }
}
