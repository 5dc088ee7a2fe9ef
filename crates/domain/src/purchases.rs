//! Purchase ledger service.
//!
//! Records restock requests. Deliberately decoupled from the catalog: a
//! received purchase never updates product stock by itself; restocking
//! is a separate manual catalog edit.

use common::{Page, PageRequest, PurchaseId};
use store::{NewPurchase, Purchase, Purchases};

use crate::status::PurchaseStatus;
use crate::DomainError;

/// Fields submitted for a new purchase record, before validation.
#[derive(Debug, Clone)]
pub struct NewPurchaseInput {
    pub owner: String,
    pub phone: String,
    pub address: String,
    pub product_name: String,
    pub product_price: f64,
    pub product_category: String,
    pub product_quantity: i64,
}

/// Service for the purchase (restock) ledger.
#[derive(Clone)]
pub struct PurchaseService<S> {
    store: S,
}

impl<S: Purchases> PurchaseService<S> {
    /// Creates a new purchase service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records a restock request. All string fields are required;
    /// price must be non-negative. Quantity zero is accepted, for
    /// entries logged before the amount is known.
    #[tracing::instrument(skip(self, input), fields(product_name = %input.product_name))]
    pub async fn create(&self, input: NewPurchaseInput) -> Result<Purchase, DomainError> {
        let owner = input.owner.trim();
        let phone = input.phone.trim();
        let address = input.address.trim();
        let product_name = input.product_name.trim();
        let product_category = input.product_category.trim();

        if owner.is_empty()
            || phone.is_empty()
            || address.is_empty()
            || product_name.is_empty()
            || product_category.is_empty()
        {
            return Err(DomainError::validation("all purchase fields are required"));
        }
        if !input.product_price.is_finite() || input.product_price < 0.0 {
            return Err(DomainError::validation(
                "purchase price must not be negative",
            ));
        }
        if input.product_quantity < 0 {
            return Err(DomainError::validation(
                "purchase quantity must not be negative",
            ));
        }

        let purchase = self
            .store
            .insert_purchase(NewPurchase {
                owner: owner.to_string(),
                phone: phone.to_string(),
                address: address.to_string(),
                product_name: product_name.to_string(),
                product_price: input.product_price,
                product_category: product_category.to_string(),
                product_quantity: input.product_quantity,
            })
            .await?;

        tracing::info!(purchase_id = %purchase.id, "purchase recorded");
        Ok(purchase)
    }

    /// Lists purchases filtered by product-name substring.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, req: &PageRequest) -> Result<Page<Purchase>, DomainError> {
        Ok(self.store.list_purchases(req).await?)
    }

    /// Updates a purchase's status within the closed status set,
    /// forward only.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: PurchaseId, status: &str) -> Result<(), DomainError> {
        let next: PurchaseStatus = status.parse()?;
        let current: PurchaseStatus = self
            .store
            .get_purchase(id)
            .await?
            .ok_or_else(|| DomainError::not_found("purchase", id))?
            .status
            .parse()?;

        if !current.can_transition_to(next) {
            return Err(DomainError::validation(format!(
                "purchase status cannot move from {current} back to {next}"
            )));
        }

        self.store.update_purchase_status(id, next.as_str()).await?;
        tracing::info!(purchase_id = %id, status = %next, "purchase status updated");
        Ok(())
    }

    /// Deletes a purchase record.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: PurchaseId) -> Result<(), DomainError> {
        self.store.delete_purchase(id).await?;
        tracing::info!(purchase_id = %id, "purchase deleted");
        Ok(())
    }
}
