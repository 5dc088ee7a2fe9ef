//! Shared types for the storefront service.

mod ids;
mod page;

pub use ids::{CustomerId, OrderId, OrderItemId, ProductId, PurchaseId};
pub use page::{PAGE_SIZE, Page, PageRequest};
