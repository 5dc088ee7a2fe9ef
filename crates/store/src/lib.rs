//! Relational persistence layer for the storefront service.
//!
//! Defines the storage traits per component (catalog, orders, purchase
//! ledger, customer accounts) plus two interchangeable implementations:
//! [`PostgresStore`] for production and [`InMemoryStore`] for tests and
//! local development.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod traits;

pub use common::{CustomerId, OrderId, OrderItemId, PAGE_SIZE, Page, PageRequest, ProductId, PurchaseId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    Customer, NewOrder, NewProduct, NewPurchase, Order, OrderItem, OrderItemDetail,
    OrderWithItems, PlacedOrder, Product, Purchase,
};
pub use traits::{Accounts, Catalog, Orders, Purchases, Store};
