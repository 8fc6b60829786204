//! # Sale Repository
//!
//! Sales Engine operations against the store.
//!
//! ## Touched Collections
//! ```text
//! create / return ──► Batches + SaleDetails + Sales + Customers
//! status update   ──► Sales + Customers (credit settlement)
//! ```

use chrono::{NaiveDate, Utc};
use frigo_core::sales::{self, LineItem, ReturnItem, SaleDraft, SaleUpdate};
use frigo_core::{Collection, Money, PaymentStatus, Sale, SaleDetail};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::collection::CollectionRepository;

const SALE_WRITE: [Collection; 4] = [
    Collection::Batches,
    Collection::SaleDetails,
    Collection::Sales,
    Collection::Customers,
];

const STATUS_WRITE: [Collection; 2] = [Collection::Sales, Collection::Customers];

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    store: CollectionRepository,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(store: CollectionRepository) -> Self {
        SaleRepository { store }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Plans a draft against current stock and records it, in one
    /// transaction. Returns the stored sale.
    pub async fn create_from_draft(&self, draft: &SaleDraft) -> DbResult<Sale> {
        let now = Utc::now();
        let sale = self
            .store
            .mutate(&SALE_WRITE, |data| {
                let (sale, lines) = draft.plan(data, now)?;
                sales::create_sale(data, sale.clone(), lines)?;
                Ok(sale)
            })
            .await?;

        info!(
            sale_id = %sale.id,
            customer_id = %sale.customer_id,
            total = %sale.total,
            method = %sale.payment_method,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Records a sale whose lines the caller already allocated.
    pub async fn create_sale(&self, sale: Sale, lines: Vec<LineItem>) -> DbResult<()> {
        let sale_id = sale.id.clone();
        self.store
            .mutate(&SALE_WRITE, |data| sales::create_sale(data, sale, lines))
            .await?;
        info!(sale_id = %sale_id, "Sale recorded");
        Ok(())
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub async fn update_sale(&self, sale_id: &str, update: SaleUpdate) -> DbResult<()> {
        self.store
            .mutate(&STATUS_WRITE, |data| sales::update_sale(data, sale_id, update))
            .await
    }

    /// Confirms delivery. See [`sales::mark_delivered`].
    pub async fn mark_delivered(&self, sale_id: &str, settle_now: bool) -> DbResult<PaymentStatus> {
        let status = self
            .store
            .mutate(&STATUS_WRITE, |data| {
                sales::mark_delivered(data, sale_id, settle_now)
            })
            .await?;
        info!(sale_id, payment = %status, "Sale delivered");
        Ok(status)
    }

    /// Takes goods back. Returns the amount credited.
    pub async fn process_return(
        &self,
        sale_id: &str,
        items: &[ReturnItem],
        reason: &str,
    ) -> DbResult<Money> {
        let now = Utc::now();
        let credit = self
            .store
            .mutate(&SALE_WRITE, |data| {
                sales::process_return(data, sale_id, items, reason, now)
            })
            .await?;
        info!(sale_id, credit = %credit, items = items.len(), "Return processed");
        Ok(credit)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Sales in `from..=to`, newest first.
    pub async fn list_sales(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<Sale>> {
        let data = self.store.load_dataset().await?;
        Ok(sales::list_sales(&data, from, to)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn get(&self, sale_id: &str) -> DbResult<Sale> {
        let sales: Vec<Sale> = self.store.get(Collection::Sales).await?;
        sales
            .into_iter()
            .find(|s| s.id == sale_id)
            .ok_or_else(|| DbError::not_found("Sale", sale_id))
    }

    pub async fn sale_details(&self, sale_id: &str) -> DbResult<Vec<SaleDetail>> {
        let data = self.store.load_dataset().await?;
        Ok(sales::sale_details(&data, sale_id)?
            .into_iter()
            .cloned()
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
