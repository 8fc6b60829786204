//! # Bulk Import
//!
//! Loads a stock sheet where each row is one batch, creating categories
//! and products on the fly.
//!
//! ```text
//! row { category: "Papas", productName: "Papa Criolla 1kg", quantity: 40, ... }
//!        │                      │
//!        ▼                      ▼
//!   match by name          match by name (case-insensitive)
//!   or create              or create with catalog defaults
//!        └──────────┬───────────┘
//!                   ▼
//!          one Available batch
//! ```
//!
//! The whole sheet is validated before anything is added, so a bad row
//! rejects the import.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::dataset::Dataset;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Batch, BatchStatus, Category, Product};
use crate::validation::{validate_amount, validate_name, validate_quantity};
use crate::{DEFAULT_MIN_STOCK, DEFAULT_RECEPTION_TEMP, DEFAULT_SHELF_LIFE_DAYS, DEFAULT_UNIT};

/// One row of a stock sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub category: String,
    pub product_name: String,
    #[serde(default)]
    pub cost_price: Option<Money>,
    #[serde(default)]
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub batch_code: Option<String>,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    #[serde(default)]
    pub temp: Option<f64>,
}

/// What an import added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub categories_created: usize,
    pub products_created: usize,
    pub batches_created: usize,
}

/// Imports every row, or none of them.
///
/// `now_millis` feeds the default batch code `IMP-{millis}`.
pub fn import_rows(
    data: &mut Dataset,
    rows: &[ImportRow],
    today: NaiveDate,
    now_millis: i64,
) -> CoreResult<ImportSummary> {
    for (index, row) in rows.iter().enumerate() {
        validate_row(row).map_err(|err| row_error(index, err))?;
    }

    let mut summary = ImportSummary::default();

    for row in rows {
        let category_name = row.category.trim();
        let category_id = match data
            .categories
            .iter()
            .find(|c| c.name.to_lowercase() == category_name.to_lowercase())
        {
            Some(c) => c.id.clone(),
            None => {
                let id = Uuid::new_v4().to_string();
                data.categories.push(Category {
                    id: id.clone(),
                    name: category_name.to_string(),
                    description: "Imported category".to_string(),
                });
                summary.categories_created += 1;
                id
            }
        };

        let product_name = row.product_name.trim();
        let product_id = match data
            .products
            .iter()
            .find(|p| p.name.to_lowercase() == product_name.to_lowercase())
        {
            Some(p) => p.id.clone(),
            None => {
                let id = Uuid::new_v4().to_string();
                data.products.push(Product {
                    id: id.clone(),
                    category_id,
                    name: product_name.to_string(),
                    description: "Imported product".to_string(),
                    cost_price: row.cost_price.unwrap_or_default(),
                    sale_price: row.sale_price.unwrap_or_default(),
                    min_stock: DEFAULT_MIN_STOCK,
                    unit: DEFAULT_UNIT.to_string(),
                    shelf_life_days: DEFAULT_SHELF_LIFE_DAYS,
                });
                summary.products_created += 1;
                id
            }
        };

        let batch_code = row
            .batch_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("IMP-{now_millis}"));

        data.batches.push(Batch {
            id: Uuid::new_v4().to_string(),
            product_id,
            batch_code,
            entry_date: today,
            expiry_date: row.expiry_date,
            initial_qty: row.quantity,
            current_qty: row.quantity,
            reception_temp: row.temp.unwrap_or(DEFAULT_RECEPTION_TEMP),
            status: BatchStatus::Available,
        });
        summary.batches_created += 1;
    }

    Ok(summary)
}

fn validate_row(row: &ImportRow) -> CoreResult<()> {
    validate_name("category", &row.category)?;
    validate_name("productName", &row.product_name)?;
    validate_quantity("quantity", row.quantity)?;
    if let Some(cost) = row.cost_price {
        validate_amount("costPrice", cost)?;
    }
    if let Some(sale) = row.sale_price {
        validate_amount("salePrice", sale)?;
    }
    Ok(())
}

fn row_error(index: usize, err: CoreError) -> CoreError {
    match err {
        CoreError::Validation(inner) => ValidationError::InvalidFormat {
            field: format!("row {}", index + 1),
            reason: inner.to_string(),
        }
        .into(),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn row(category: &str, product: &str, qty: i64) -> ImportRow {
        ImportRow {
            category: category.into(),
            product_name: product.into(),
            cost_price: None,
            sale_price: Some(Money::from_pesos(9000)),
            batch_code: None,
            expiry_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            quantity: qty,
            temp: None,
        }
    }

    #[test]
    fn test_import_matches_existing_case_insensitive() {
        let mut data = seed::dataset();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let summary = import_rows(
            &mut data,
            &[row("EMPANADAS", "empanada de carne x 10", 25)],
            today,
            1717200000000,
        )
        .unwrap();

        assert_eq!(summary.categories_created, 0);
        assert_eq!(summary.products_created, 0);
        assert_eq!(summary.batches_created, 1);

        let batch = data.batches.last().unwrap();
        assert_eq!(batch.product_id, "p1");
        assert_eq!(batch.batch_code, "IMP-1717200000000");
        assert_eq!(batch.reception_temp, -18.0);
        assert_eq!(batch.entry_date, today);
    }

    #[test]
    fn test_import_creates_missing_catalog_entries() {
        let mut data = seed::dataset();
        let summary = import_rows(
            &mut data,
            &[row("Arepas", "Arepa de Choclo", 10), row("arepas", "Arepa de Queso", 5)],
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            0,
        )
        .unwrap();

        assert_eq!(summary.categories_created, 1);
        assert_eq!(summary.products_created, 2);

        let product = data.products.iter().find(|p| p.name == "Arepa de Queso").unwrap();
        assert_eq!(product.min_stock, DEFAULT_MIN_STOCK);
        assert_eq!(product.unit, "Unidad");
        assert_eq!(product.shelf_life_days, 90);
        assert!(product.cost_price.is_zero());
    }

    #[test]
    fn test_bad_row_rejects_whole_sheet() {
        let mut data = seed::dataset();
        let before = data.clone();

        let err = import_rows(
            &mut data,
            &[row("Papas", "Papa Criolla", 10), row("Papas", "Papa Sabanera", 0)],
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            0,
        )
        .unwrap_err();

        assert!(err.to_string().contains("row 2"));
        assert_eq!(data, before);
    }
}
