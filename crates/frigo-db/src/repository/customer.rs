//! # Customer Repository
//!
//! Customer records and the Customer Ledger repair pass.

use frigo_core::ledger::{self, BalanceCorrection, CustomerInput};
use frigo_core::{Collection, Customer};
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::collection::CollectionRepository;

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    store: CollectionRepository,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(store: CollectionRepository) -> Self {
        CustomerRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        self.store.get(Collection::Customers).await
    }

    pub async fn get(&self, customer_id: &str) -> DbResult<Customer> {
        self.list()
            .await?
            .into_iter()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| DbError::not_found("Customer", customer_id))
    }

    /// Registers or edits a customer and returns its id.
    pub async fn upsert(&self, input: CustomerInput) -> DbResult<String> {
        self.store
            .mutate(&[Collection::Customers], |data| {
                ledger::upsert_customer(data, input)
            })
            .await
    }

    /// Deletes a customer. Their sales stay in history.
    pub async fn delete(&self, customer_id: &str) -> DbResult<()> {
        self.store
            .mutate(&[Collection::Customers], |data| {
                ledger::delete_customer(data, customer_id)
            })
            .await?;
        info!(customer_id, "Customer deleted");
        Ok(())
    }

    /// Rebuilds every balance from sale history and commits the result.
    ///
    /// Returns only the balances that changed.
    pub async fn recompute_balances(&self) -> DbResult<Vec<BalanceCorrection>> {
        let corrections = self
            .store
            .mutate(&[Collection::Customers], |data| {
                Ok(ledger::recompute_balances(data))
            })
            .await?;

        for c in &corrections {
            warn!(
                customer_id = %c.customer_id,
                previous = %c.previous,
                recomputed = %c.recomputed,
                "Customer balance corrected"
            );
        }
        info!(corrected = corrections.len(), "Balance recompute complete");
        Ok(corrections)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use frigo_core::ledger::CustomerInput;
    use frigo_core::sales::SaleDraft;
    use frigo_core::{Money, PaymentMethod};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.collections().init().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_upsert_new_customer_starts_at_zero() {
        let db = seeded().await;
        let id = db
            .customers()
            .upsert(CustomerInput {
                id: None,
                business_name: "Tienda La Esquina".to_string(),
                contact_person: "Marta".to_string(),
                phone: String::new(),
                address: "Cra 45 #12-30".to_string(),
                city: "Barranquilla".to_string(),
                coordinates: None,
                credit_limit: Money::from_pesos(300000),
                visit_day: 3,
            })
            .await
            .unwrap();

        let customer = db.customers().get(&id).await.unwrap();
        assert!(customer.current_balance.is_zero());
        assert_eq!(db.customers().list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_recompute_repairs_drift() {
        let db = seeded().await;

        // Seed balances carry no sale history behind them
        let first = db.customers().recompute_balances().await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(db.customers().recompute_balances().await.unwrap().is_empty());

        let draft = SaleDraft::new("c2", "admin", PaymentMethod::Credit).line("p3", 2);
        db.sales().create_from_draft(&draft).await.unwrap();

        assert!(db.customers().recompute_balances().await.unwrap().is_empty());
        let c2 = db.customers().get("c2").await.unwrap();
        assert_eq!(c2.current_balance, Money::from_pesos(32000));
    }

    #[tokio::test]
    async fn test_delete_missing_customer() {
        let db = seeded().await;
        db.customers().delete("c3").await.unwrap();
        assert!(db.customers().get("c3").await.unwrap_err().is_not_found());
        assert!(db.customers().delete("c3").await.unwrap_err().is_not_found());
    }
}
