//! Domain services for the storefront.
//!
//! Each service wraps one storage component and owns that component's
//! validation rules and error mapping: [`CatalogService`] for products,
//! [`OrderService`] for the order placement transaction,
//! [`PurchaseService`] for the restock ledger, and [`AccountService`]
//! for customer registration and authentication.

pub mod accounts;
pub mod catalog;
pub mod error;
pub mod orders;
pub mod purchases;
pub mod status;

pub use accounts::{AccountService, hash_password, verify_password};
pub use catalog::{CatalogService, NewProductInput};
pub use error::DomainError;
pub use orders::{OrderService, PlaceOrderInput};
pub use purchases::{NewPurchaseInput, PurchaseService};
pub use status::{OrderStatus, PurchaseStatus};
