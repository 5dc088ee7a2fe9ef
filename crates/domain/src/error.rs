//! Domain error taxonomy.
//!
//! Every failure a service can signal falls into one of these classes;
//! the API layer maps each class to a distinct user-facing response.

use common::ProductId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing or invalid input fields.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced row does not exist.
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    /// A uniqueness rule was violated.
    #[error("duplicate {entity}: {detail}")]
    Duplicate {
        entity: &'static str,
        detail: String,
    },

    /// An order asked for more units than the product has in stock.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// A row cannot be deleted while other rows reference it.
    #[error("{entity} {id} is still referenced by existing orders")]
    Referenced { entity: &'static str, id: i64 },

    /// Username or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing failed.
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),

    /// The underlying store failed. Surfaced generically to users.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => DomainError::NotFound {
                entity,
                key: id.to_string(),
            },
            StoreError::Duplicate { entity, detail } => DomainError::Duplicate { entity, detail },
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => DomainError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StoreError::Referenced { entity, id } => DomainError::Referenced { entity, id },
            other => DomainError::Store(other),
        }
    }
}

impl DomainError {
    /// Shorthand for a [`DomainError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Shorthand for a [`DomainError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}
