//! Row types for the five storefront tables.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, OrderItemId, ProductId, PurchaseId};
use serde::Serialize;

/// A sellable product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
}

/// A customer's sales order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

/// One line item of an order. The order owns its items; the product is
/// referenced only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A line item joined with its product fields, as the listing and
/// export views need it. Materialized eagerly per access pattern, so
/// readers never walk a lazy object graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemDetail {
    pub item_id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub product_name: String,
    pub product_price: f64,
    pub product_category: String,
}

/// An order with all its line items materialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

/// Fields for placing a new order. Exactly one product/quantity pair.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: String,
    pub phone: String,
    pub address: String,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// The durably committed result of a successful order placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub item: OrderItem,
}

/// A staff-entered restock record. Product fields are a denormalized
/// snapshot, not a reference into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub owner: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub product_name: String,
    pub product_price: f64,
    pub product_category: String,
    pub product_quantity: i64,
    pub status: String,
}

/// Fields for inserting a new purchase record.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub owner: String,
    pub phone: String,
    pub address: String,
    pub product_name: String,
    pub product_price: f64,
    pub product_category: String,
    pub product_quantity: i64,
}

/// A registered customer account. The password is only ever stored as
/// a salted hash.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub username: String,
    pub password_hash: String,
}
