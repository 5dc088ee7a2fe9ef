//! Catalog service: product creation, listing, and deletion.

use common::{Page, PageRequest, ProductId};
use store::{Catalog, NewProduct, Product};

use crate::DomainError;

/// Fields submitted for a new product, before validation.
#[derive(Debug, Clone)]
pub struct NewProductInput {
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
}

/// Service for managing the product catalog.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: Catalog> CatalogService<S> {
    /// Creates a new catalog service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a product.
    ///
    /// Rejects empty name or category, negative price or stock, and a
    /// (name, category) pair that already exists in the catalog.
    #[tracing::instrument(skip(self))]
    pub async fn create_product(&self, input: NewProductInput) -> Result<Product, DomainError> {
        let name = input.name.trim();
        let category = input.category.trim();

        if name.is_empty() {
            return Err(DomainError::validation("product name must not be empty"));
        }
        if category.is_empty() {
            return Err(DomainError::validation("product category must not be empty"));
        }
        if !input.price.is_finite() || input.price < 0.0 {
            return Err(DomainError::validation("product price must not be negative"));
        }
        if input.stock < 0 {
            return Err(DomainError::validation("product stock must not be negative"));
        }

        if let Some(existing) = self.store.find_product(name, category).await? {
            return Err(DomainError::Duplicate {
                entity: "product",
                detail: format!("{} ({}) already exists as #{}", name, category, existing.id),
            });
        }

        let product = self
            .store
            .insert_product(NewProduct {
                name: name.to_string(),
                price: input.price,
                stock: input.stock,
                category: category.to_string(),
            })
            .await?;

        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Looks up one product.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    /// Lists products filtered by name substring, ordered by ID.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, req: &PageRequest) -> Result<Page<Product>, DomainError> {
        Ok(self.store.list_products(req).await?)
    }

    /// Deletes a product by ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), DomainError> {
        self.store.delete_product(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}
