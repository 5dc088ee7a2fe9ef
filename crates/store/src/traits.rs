//! Storage traits, one per storefront component.
//!
//! Each trait is implemented by both [`crate::PostgresStore`] and
//! [`crate::InMemoryStore`]; services are generic over them so the
//! whole stack runs against either backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, Page, PageRequest, ProductId, PurchaseId};

use crate::Result;
use crate::records::{
    Customer, NewOrder, NewProduct, NewPurchase, OrderWithItems, PlacedOrder, Product, Purchase,
};

/// Catalog component: product rows and their stock levels.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Inserts a new product and returns the stored row.
    async fn insert_product(&self, new: NewProduct) -> Result<Product>;

    /// Looks up a product by ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Finds a product with the exact (name, category) pair, used for
    /// the write-time uniqueness check.
    async fn find_product(&self, name: &str, category: &str) -> Result<Option<Product>>;

    /// Lists products filtered by case-insensitive name substring,
    /// ordered by ID ascending.
    async fn list_products(&self, req: &PageRequest) -> Result<Page<Product>>;

    /// Deletes a product. Fails with `NotFound` if the ID is unknown.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// All products created at or after `since` (all products when `None`),
    /// ordered by ID.
    async fn products_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Product>>;
}

/// Orders component, including the one transactional operation in the
/// system: check stock, create the order and its item, decrement stock.
#[async_trait]
pub trait Orders: Send + Sync {
    /// Atomically places an order.
    ///
    /// Either all three effects (order row, order-item row, stock
    /// decrement) commit, or none do. Conflicting placements over the
    /// same product are serialized so stock never goes negative.
    /// Fails with `NotFound` when the product is absent and
    /// `InsufficientStock` when `quantity` exceeds the current stock.
    async fn place_order(&self, new: NewOrder) -> Result<PlacedOrder>;

    /// Loads one order with its items materialized.
    async fn get_order_with_items(&self, id: OrderId) -> Result<Option<OrderWithItems>>;

    /// Lists orders with items, filtered by case-insensitive substring
    /// on any line item's product name, ordered by order ID.
    async fn list_orders(&self, req: &PageRequest) -> Result<Page<OrderWithItems>>;

    /// Lists only the orders whose customer name equals `customer`,
    /// same filtering and ordering as [`Orders::list_orders`].
    async fn list_orders_for_customer(
        &self,
        customer: &str,
        req: &PageRequest,
    ) -> Result<Page<OrderWithItems>>;

    /// Overwrites the status of an order.
    async fn update_order_status(&self, id: OrderId, status: &str) -> Result<()>;

    /// Deletes an order along with its items.
    async fn delete_order(&self, id: OrderId) -> Result<()>;

    /// All orders created at or after `since`, with items, ordered by ID.
    async fn orders_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<OrderWithItems>>;
}

/// Purchase ledger component. Deliberately not linked to catalog stock:
/// a received purchase does not replenish products.
#[async_trait]
pub trait Purchases: Send + Sync {
    /// Inserts a new purchase record and returns the stored row.
    async fn insert_purchase(&self, new: NewPurchase) -> Result<Purchase>;

    /// Looks up a purchase by ID.
    async fn get_purchase(&self, id: PurchaseId) -> Result<Option<Purchase>>;

    /// Lists purchases filtered by case-insensitive substring on the
    /// snapshotted product name, ordered by ID.
    async fn list_purchases(&self, req: &PageRequest) -> Result<Page<Purchase>>;

    /// Overwrites the status of a purchase.
    async fn update_purchase_status(&self, id: PurchaseId, status: &str) -> Result<()>;

    /// Deletes a purchase record.
    async fn delete_purchase(&self, id: PurchaseId) -> Result<()>;

    /// All purchases created at or after `since`, ordered by ID.
    async fn purchases_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Purchase>>;
}

/// Customer accounts component. Staff credentials live in configuration,
/// never in this table.
#[async_trait]
pub trait Accounts: Send + Sync {
    /// Inserts a new customer account. Fails with `Duplicate` when the
    /// username is taken.
    async fn insert_customer(&self, username: &str, password_hash: &str) -> Result<Customer>;

    /// Finds a customer account by username.
    async fn find_customer(&self, username: &str) -> Result<Option<Customer>>;
}

/// The full storage surface, for code generic over a complete backend.
pub trait Store: Catalog + Orders + Purchases + Accounts + Clone + Send + Sync + 'static {}

impl<T> Store for T where T: Catalog + Orders + Purchases + Accounts + Clone + Send + Sync + 'static {}
