use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, Page, PageRequest, ProductId, PurchaseId, PAGE_SIZE};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    records::{
        Customer, NewOrder, NewProduct, NewPurchase, Order, OrderItem, OrderItemDetail,
        OrderWithItems, PlacedOrder, Product, Purchase,
    },
    traits::{Accounts, Catalog, Orders, Purchases},
};

/// In-memory store implementation for testing and local development.
///
/// Provides the same interface and semantics as the PostgreSQL
/// implementation. All mutations take the single write lock, so the
/// place-order check-then-decrement is serialized exactly like the
/// conditional update is in SQL.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    products: BTreeMap<i64, Product>,
    orders: BTreeMap<i64, Order>,
    order_items: BTreeMap<i64, OrderItem>,
    purchases: BTreeMap<i64, Purchase>,
    customers: BTreeMap<i64, Customer>,
    next_product_id: i64,
    next_order_id: i64,
    next_item_id: i64,
    next_purchase_id: i64,
    next_customer_id: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn paginate<T>(rows: Vec<T>, req: &PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let page = req.page_number();
    let items: Vec<T> = rows
        .into_iter()
        .skip(req.offset() as usize)
        .take(PAGE_SIZE as usize)
        .collect();
    Page::new(items, page, total)
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Clears all rows.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        *inner = Inner::default();
    }
}

impl Inner {
    fn items_for_order(&self, order_id: OrderId) -> Vec<OrderItemDetail> {
        self.order_items
            .values()
            .filter(|i| i.order_id == order_id)
            .map(|i| {
                // FK guarantees the product row exists for live items.
                let product = &self.products[&i.product_id.as_i64()];
                OrderItemDetail {
                    item_id: i.id,
                    product_id: i.product_id,
                    quantity: i.quantity,
                    product_name: product.name.clone(),
                    product_price: product.price,
                    product_category: product.category.clone(),
                }
            })
            .collect()
    }

    fn order_with_items(&self, order: &Order) -> OrderWithItems {
        OrderWithItems {
            order: order.clone(),
            items: self.items_for_order(order.id),
        }
    }
}

#[async_trait]
impl Catalog for InMemoryStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let mut inner = self.inner.write().await;
        let id = next(&mut inner.next_product_id);
        let product = Product {
            id: ProductId::new(id),
            name: new.name,
            price: new.price,
            stock: new.stock,
            category: new.category,
            created_at: Utc::now(),
        };
        inner.products.insert(id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(&id.as_i64()).cloned())
    }

    async fn find_product(&self, name: &str, category: &str) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .values()
            .find(|p| p.name == name && p.category == category)
            .cloned())
    }

    async fn list_products(&self, req: &PageRequest) -> Result<Page<Product>> {
        let inner = self.inner.read().await;
        let rows: Vec<Product> = inner
            .products
            .values()
            .filter(|p| req.search_term().is_none_or(|t| contains_ci(&p.name, t)))
            .cloned()
            .collect();
        Ok(paginate(rows, req))
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.products.contains_key(&id.as_i64()) {
            return Err(StoreError::not_found("product", id.as_i64()));
        }
        if inner.order_items.values().any(|i| i.product_id == id) {
            return Err(StoreError::Referenced {
                entity: "product",
                id: id.as_i64(),
            });
        }
        inner.products.remove(&id.as_i64());
        Ok(())
    }

    async fn products_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .values()
            .filter(|p| since.is_none_or(|s| p.created_at >= s))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Orders for InMemoryStore {
    async fn place_order(&self, new: NewOrder) -> Result<PlacedOrder> {
        // One write lock across check, decrement, and inserts: no other
        // placement can observe the intermediate state.
        let mut inner = self.inner.write().await;

        let product = inner
            .products
            .get_mut(&new.product_id.as_i64())
            .ok_or_else(|| StoreError::not_found("product", new.product_id.as_i64()))?;

        if product.stock < new.quantity {
            return Err(StoreError::InsufficientStock {
                product_id: new.product_id,
                requested: new.quantity,
                available: product.stock,
            });
        }
        product.stock -= new.quantity;

        let order_id = next(&mut inner.next_order_id);
        let order = Order {
            id: OrderId::new(order_id),
            customer: new.customer,
            phone: new.phone,
            address: new.address,
            created_at: Utc::now(),
            status: "pending".to_string(),
        };
        inner.orders.insert(order_id, order.clone());

        let item_id = next(&mut inner.next_item_id);
        let item = OrderItem {
            id: common::OrderItemId::new(item_id),
            order_id: order.id,
            product_id: new.product_id,
            quantity: new.quantity,
        };
        inner.order_items.insert(item_id, item.clone());

        Ok(PlacedOrder { order, item })
    }

    async fn get_order_with_items(&self, id: OrderId) -> Result<Option<OrderWithItems>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .get(&id.as_i64())
            .map(|o| inner.order_with_items(o)))
    }

    async fn list_orders(&self, req: &PageRequest) -> Result<Page<OrderWithItems>> {
        let inner = self.inner.read().await;
        let rows: Vec<OrderWithItems> = inner
            .orders
            .values()
            .map(|o| inner.order_with_items(o))
            .filter(|o| {
                req.search_term().is_none_or(|t| {
                    o.items.iter().any(|i| contains_ci(&i.product_name, t))
                })
            })
            .collect();
        Ok(paginate(rows, req))
    }

    async fn list_orders_for_customer(
        &self,
        customer: &str,
        req: &PageRequest,
    ) -> Result<Page<OrderWithItems>> {
        let inner = self.inner.read().await;
        let rows: Vec<OrderWithItems> = inner
            .orders
            .values()
            .filter(|o| o.customer == customer)
            .map(|o| inner.order_with_items(o))
            .filter(|o| {
                req.search_term()
                    .is_none_or(|t| o.items.iter().any(|i| contains_ci(&i.product_name, t)))
            })
            .collect();
        Ok(paginate(rows, req))
    }

    async fn update_order_status(&self, id: OrderId, status: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("order", id.as_i64()))?;
        order.status = status.to_string();
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.orders.remove(&id.as_i64()).is_none() {
            return Err(StoreError::not_found("order", id.as_i64()));
        }
        // Cascade, as the FK does in SQL.
        inner.order_items.retain(|_, i| i.order_id != id);
        Ok(())
    }

    async fn orders_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<OrderWithItems>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .filter(|o| since.is_none_or(|s| o.created_at >= s))
            .map(|o| inner.order_with_items(o))
            .collect())
    }
}

#[async_trait]
impl Purchases for InMemoryStore {
    async fn insert_purchase(&self, new: NewPurchase) -> Result<Purchase> {
        let mut inner = self.inner.write().await;
        let id = next(&mut inner.next_purchase_id);
        let purchase = Purchase {
            id: PurchaseId::new(id),
            owner: new.owner,
            phone: new.phone,
            address: new.address,
            created_at: Utc::now(),
            product_name: new.product_name,
            product_price: new.product_price,
            product_category: new.product_category,
            product_quantity: new.product_quantity,
            status: "pending".to_string(),
        };
        inner.purchases.insert(id, purchase.clone());
        Ok(purchase)
    }

    async fn get_purchase(&self, id: PurchaseId) -> Result<Option<Purchase>> {
        let inner = self.inner.read().await;
        Ok(inner.purchases.get(&id.as_i64()).cloned())
    }

    async fn list_purchases(&self, req: &PageRequest) -> Result<Page<Purchase>> {
        let inner = self.inner.read().await;
        let rows: Vec<Purchase> = inner
            .purchases
            .values()
            .filter(|p| {
                req.search_term()
                    .is_none_or(|t| contains_ci(&p.product_name, t))
            })
            .cloned()
            .collect();
        Ok(paginate(rows, req))
    }

    async fn update_purchase_status(&self, id: PurchaseId, status: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let purchase = inner
            .purchases
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::not_found("purchase", id.as_i64()))?;
        purchase.status = status.to_string();
        Ok(())
    }

    async fn delete_purchase(&self, id: PurchaseId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.purchases.remove(&id.as_i64()).is_none() {
            return Err(StoreError::not_found("purchase", id.as_i64()));
        }
        Ok(())
    }

    async fn purchases_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Purchase>> {
        let inner = self.inner.read().await;
        Ok(inner
            .purchases
            .values()
            .filter(|p| since.is_none_or(|s| p.created_at >= s))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Accounts for InMemoryStore {
    async fn insert_customer(&self, username: &str, password_hash: &str) -> Result<Customer> {
        let mut inner = self.inner.write().await;
        if inner.customers.values().any(|c| c.username == username) {
            return Err(StoreError::duplicate("customer", username));
        }
        let id = next(&mut inner.next_customer_id);
        let customer = Customer {
            id: CustomerId::new(id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        inner.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn find_customer(&self, username: &str) -> Result<Option<Customer>> {
        let inner = self.inner.read().await;
        Ok(inner
            .customers
            .values()
            .find(|c| c.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: i64) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            price: 9.99,
            stock,
            category: "tools".to_string(),
        }
    }

    fn order_for(product_id: ProductId, quantity: i64) -> NewOrder {
        NewOrder {
            customer: "Alice".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Main St".to_string(),
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn place_order_decrements_stock() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(10)).await.unwrap();

        let placed = store.place_order(order_for(product.id, 3)).await.unwrap();
        assert_eq!(placed.item.quantity, 3);
        assert_eq!(placed.order.status, "pending");

        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 7);
    }

    #[tokio::test]
    async fn place_order_insufficient_stock_leaves_no_writes() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(2)).await.unwrap();

        let result = store.place_order(order_for(product.id, 3)).await;
        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            })
        ));

        assert_eq!(store.order_count().await, 0);
        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 2);
    }

    #[tokio::test]
    async fn place_order_unknown_product() {
        let store = InMemoryStore::new();
        let result = store.place_order(order_for(ProductId::new(99), 1)).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn concurrent_placements_never_oversell() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(1)).await.unwrap();

        let (a, b) = tokio::join!(
            store.place_order(order_for(product.id, 1)),
            store.place_order(order_for(product.id, 1)),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(
            [a, b]
                .into_iter()
                .any(|r| matches!(r, Err(StoreError::InsufficientStock { .. })))
        );

        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);
    }

    #[tokio::test]
    async fn list_products_filters_case_insensitively() {
        let store = InMemoryStore::new();
        for name in ["Widget", "Gadget", "Widgets"] {
            store
                .insert_product(NewProduct {
                    name: name.to_string(),
                    price: 1.0,
                    stock: 1,
                    category: "tools".to_string(),
                })
                .await
                .unwrap();
        }

        let page = store
            .list_products(&PageRequest::search("wid"))
            .await
            .unwrap();
        let names: Vec<&str> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Widget", "Widgets"]);
    }

    #[tokio::test]
    async fn pagination_shape_over_25_rows() {
        let store = InMemoryStore::new();
        for i in 0..25 {
            store
                .insert_product(NewProduct {
                    name: format!("Item {i}"),
                    price: 1.0,
                    stock: 1,
                    category: "bulk".to_string(),
                })
                .await
                .unwrap();
        }

        let p1 = store.list_products(&PageRequest::page(1)).await.unwrap();
        assert_eq!(p1.items.len(), 10);
        assert_eq!(p1.total_items, 25);
        assert_eq!(p1.total_pages, 3);

        let p3 = store.list_products(&PageRequest::page(3)).await.unwrap();
        assert_eq!(p3.items.len(), 5);

        let p4 = store.list_products(&PageRequest::page(4)).await.unwrap();
        assert!(p4.items.is_empty());
    }

    #[tokio::test]
    async fn delete_order_cascades_items() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(5)).await.unwrap();
        let placed = store.place_order(order_for(product.id, 1)).await.unwrap();

        store.delete_order(placed.order.id).await.unwrap();

        let inner = store.inner.read().await;
        assert!(inner.order_items.is_empty());
    }

    #[tokio::test]
    async fn delete_product_referenced_by_order() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(5)).await.unwrap();
        store.place_order(order_for(product.id, 1)).await.unwrap();

        let result = store.delete_product(product.id).await;
        assert!(matches!(result, Err(StoreError::Referenced { .. })));
    }

    #[tokio::test]
    async fn list_orders_searches_product_name() {
        let store = InMemoryStore::new();
        let widget_id = store.insert_product(widget(5)).await.unwrap().id;
        let gadget_id = store
            .insert_product(NewProduct {
                name: "Gadget".to_string(),
                price: 2.0,
                stock: 5,
                category: "tools".to_string(),
            })
            .await
            .unwrap()
            .id;
        store.place_order(order_for(widget_id, 1)).await.unwrap();
        store.place_order(order_for(gadget_id, 1)).await.unwrap();

        let page = store
            .list_orders(&PageRequest::search("gadg"))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].items[0].product_name, "Gadget");
    }

    #[tokio::test]
    async fn orders_for_customer_excludes_other_customers() {
        let store = InMemoryStore::new();
        let product = store.insert_product(widget(5)).await.unwrap();
        store.place_order(order_for(product.id, 1)).await.unwrap();
        store
            .place_order(NewOrder {
                customer: "Bob".to_string(),
                phone: "555-0101".to_string(),
                address: "2 Side St".to_string(),
                product_id: product.id,
                quantity: 1,
            })
            .await
            .unwrap();

        let page = store
            .list_orders_for_customer("Alice", &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].order.customer, "Alice");
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let store = InMemoryStore::new();
        store.insert_customer("alice", "hash-a").await.unwrap();

        let result = store.insert_customer("alice", "hash-b").await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn update_status_unknown_order() {
        let store = InMemoryStore::new();
        let result = store
            .update_order_status(OrderId::new(1), "processing")
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
