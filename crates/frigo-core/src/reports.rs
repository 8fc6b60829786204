//! # Reports
//!
//! Read-only views over a dataset: dashboard figures, stock alerts and the
//! stop list for a route day.

use chrono::NaiveDate;
use serde::Serialize;
use ts_rs::TS;

use crate::dataset::Dataset;
use crate::inventory::product_stock;
use crate::money::Money;
use crate::types::{Batch, Coordinates, Customer};
use crate::EXPIRY_WARNING_DAYS;

/// Stock on hand for one product.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductStock {
    pub product_id: String,
    pub name: String,
    pub unit: String,
    pub stock: i64,
    pub min_stock: i64,
}

impl ProductStock {
    pub fn is_low(&self) -> bool {
        self.stock < self.min_stock
    }
}

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Σ total over every sale, returned ones included.
    pub total_sales: Money,
    pub sale_count: usize,
    /// Σ current balance over every customer.
    pub pending_collections: Money,
    pub low_stock_count: usize,
    pub expiring_count: usize,
}

/// Computes the dashboard figures as of `today`.
pub fn dashboard(data: &Dataset, today: NaiveDate) -> DashboardStats {
    DashboardStats {
        total_sales: data.sales.iter().map(|s| s.total).sum(),
        sale_count: data.sales.len(),
        pending_collections: data.customers.iter().map(|c| c.current_balance).sum(),
        low_stock_count: low_stock(data).len(),
        expiring_count: expiring_batches(data, today, EXPIRY_WARNING_DAYS).len(),
    }
}

/// Stock per product, in catalog order.
pub fn stock_levels(data: &Dataset) -> Vec<ProductStock> {
    data.products
        .iter()
        .map(|p| ProductStock {
            product_id: p.id.clone(),
            name: p.name.clone(),
            unit: p.unit.clone(),
            stock: product_stock(&data.batches, &p.id),
            min_stock: p.min_stock,
        })
        .collect()
}

/// Products whose stock is under their minimum.
pub fn low_stock(data: &Dataset) -> Vec<ProductStock> {
    stock_levels(data).into_iter().filter(ProductStock::is_low).collect()
}

/// Batches expiring after `today` and no more than `days` days ahead,
/// soonest first. Already expired batches are not included.
pub fn expiring_batches(data: &Dataset, today: NaiveDate, days: i64) -> Vec<&Batch> {
    let mut batches: Vec<&Batch> = data
        .batches
        .iter()
        .filter(|b| {
            let left = b.days_until_expiry(today);
            left > 0 && left <= days
        })
        .collect();
    batches.sort_by_key(|b| b.expiry_date);
    batches
}

/// Customers visited on `visit_day` (1 = Monday), in stored order.
pub fn customers_for_day(data: &Dataset, visit_day: u8) -> Vec<&Customer> {
    data.customers
        .iter()
        .filter(|c| c.visit_day == visit_day)
        .collect()
}

/// One stop of a delivery route.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    pub business_name: String,
    pub address: String,
    pub coordinates: Coordinates,
    /// Outstanding credit to collect at this stop.
    pub balance: Money,
}

/// The stops for a route day.
pub fn route_stops(data: &Dataset, visit_day: u8) -> Vec<RouteStop> {
    customers_for_day(data, visit_day)
        .into_iter()
        .map(|c| RouteStop {
            business_name: c.business_name.clone(),
            address: c.address.clone(),
            coordinates: c.coordinates,
            balance: c.current_balance,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_dashboard_on_seed_data() {
        let data = seed::dataset();
        let stats = dashboard(&data, date(2024, 4, 10));

        assert!(stats.total_sales.is_zero());
        assert_eq!(stats.pending_collections.pesos(), 370000);
        // p3 holds 12 of a minimum of 20
        assert_eq!(stats.low_stock_count, 1);
        // b3 expires on 2024-04-20
        assert_eq!(stats.expiring_count, 1);
    }

    #[test]
    fn test_expiring_window_excludes_past_and_far() {
        let data = seed::dataset();

        assert_eq!(expiring_batches(&data, date(2024, 4, 5), 15).len(), 1);
        assert_eq!(expiring_batches(&data, date(2024, 4, 4), 15).len(), 0);
        assert_eq!(expiring_batches(&data, date(2024, 4, 20), 15).len(), 0);
        assert_eq!(expiring_batches(&data, date(2024, 4, 25), 15).len(), 0);
    }

    #[test]
    fn test_route_day() {
        let data = seed::dataset();
        let monday: Vec<&str> = customers_for_day(&data, 1).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(monday, vec!["c1", "c3"]);

        let stops = route_stops(&data, 2);
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].business_name, "Restaurante El Paisa");
        assert!(customers_for_day(&data, 5).is_empty());
    }

    #[test]
    fn test_stock_levels() {
        let data = seed::dataset();
        let levels = stock_levels(&data);
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].stock, 85);
        assert_eq!(low_stock(&data)[0].product_id, "p3");
    }
}
