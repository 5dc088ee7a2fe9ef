use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, OrderItemId, Page, PageRequest, ProductId, PurchaseId, PAGE_SIZE};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Result, StoreError,
    records::{
        Customer, NewOrder, NewProduct, NewPurchase, Order, OrderItem, OrderItemDetail,
        OrderWithItems, PlacedOrder, Product, Purchase,
    },
    traits::{Accounts, Catalog, Orders, Purchases},
};

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a fresh pool to `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("migrations applied");
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            category: row.try_get("category")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            customer: row.try_get("customer")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            status: row.try_get("status")?,
        })
    }

    fn row_to_purchase(row: PgRow) -> Result<Purchase> {
        Ok(Purchase {
            id: PurchaseId::new(row.try_get("id")?),
            owner: row.try_get("owner")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            product_name: row.try_get("product_name")?,
            product_price: row.try_get("product_price")?,
            product_category: row.try_get("product_category")?,
            product_quantity: row.try_get("product_quantity")?,
            status: row.try_get("status")?,
        })
    }

    fn row_to_customer(row: PgRow) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::new(row.try_get("id")?),
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
        })
    }

    /// Fetches the materialized line items for a set of orders in one
    /// query, grouped by order, so listing N orders costs two queries
    /// rather than N+1.
    async fn items_for_orders(
        &self,
        order_ids: &[i64],
    ) -> Result<Vec<(OrderId, OrderItemDetail)>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.order_id, i.product_id, i.quantity,
                   p.name AS product_name, p.price AS product_price,
                   p.category AS product_category
            FROM order_items i
            JOIN products p ON p.id = i.product_id
            WHERE i.order_id = ANY($1)
            ORDER BY i.id ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let order_id = OrderId::new(row.try_get("order_id")?);
                let detail = OrderItemDetail {
                    item_id: OrderItemId::new(row.try_get("id")?),
                    product_id: ProductId::new(row.try_get("product_id")?),
                    quantity: row.try_get("quantity")?,
                    product_name: row.try_get("product_name")?,
                    product_price: row.try_get("product_price")?,
                    product_category: row.try_get("product_category")?,
                };
                Ok((order_id, detail))
            })
            .collect()
    }

    fn assemble(orders: Vec<Order>, items: Vec<(OrderId, OrderItemDetail)>) -> Vec<OrderWithItems> {
        orders
            .into_iter()
            .map(|order| {
                let items = items
                    .iter()
                    .filter(|(id, _)| *id == order.id)
                    .map(|(_, d)| d.clone())
                    .collect();
                OrderWithItems { order, items }
            })
            .collect()
    }
}

fn like_pattern(req: &PageRequest) -> Option<String> {
    req.search_term().map(|t| format!("%{t}%"))
}

#[async_trait]
impl Catalog for PostgresStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, price, stock, category)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, price, stock, category, created_at
            "#,
        )
        .bind(&new.name)
        .bind(new.price)
        .bind(new.stock)
        .bind(&new.category)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, price, stock, category, created_at FROM products WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_product(&self, name: &str, category: &str) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price, stock, category, created_at
            FROM products
            WHERE name = $1 AND category = $2
            "#,
        )
        .bind(name)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, req: &PageRequest) -> Result<Page<Product>> {
        let pattern = like_pattern(req);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE $1::text IS NULL OR name ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, price, stock, category, created_at
            FROM products
            WHERE $1::text IS NULL OR name ILIKE $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(i64::from(PAGE_SIZE))
        .bind(req.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, req.page_number(), total as u64))
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return StoreError::Referenced {
                        entity: "product",
                        id: id.as_i64(),
                    };
                }
                StoreError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id.as_i64()));
        }
        Ok(())
    }

    async fn products_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, price, stock, category, created_at
            FROM products
            WHERE $1::timestamptz IS NULL OR created_at >= $1
            ORDER BY id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }
}

#[async_trait]
impl Orders for PostgresStore {
    async fn place_order(&self, new: NewOrder) -> Result<PlacedOrder> {
        // Single transaction around the conditional decrement and both
        // inserts. The decrement's row lock serializes concurrent
        // placements over the same product, so the stock check can
        // never be double-spent.
        let mut tx = self.pool.begin().await?;

        let decremented: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(new.product_id.as_i64())
        .bind(new.quantity)
        .fetch_optional(&mut *tx)
        .await?;

        if decremented.is_none() {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                    .bind(new.product_id.as_i64())
                    .fetch_optional(&mut *tx)
                    .await?;

            tracing::debug!(
                product_id = %new.product_id,
                quantity = new.quantity,
                "conditional stock decrement matched no row"
            );
            // Dropping the transaction rolls it back.
            return Err(match available {
                None => StoreError::not_found("product", new.product_id.as_i64()),
                Some(available) => StoreError::InsufficientStock {
                    product_id: new.product_id,
                    requested: new.quantity,
                    available,
                },
            });
        }

        let order_row = sqlx::query(
            r#"
            INSERT INTO orders (customer, phone, address)
            VALUES ($1, $2, $3)
            RETURNING id, customer, phone, address, created_at, status
            "#,
        )
        .bind(&new.customer)
        .bind(&new.phone)
        .bind(&new.address)
        .fetch_one(&mut *tx)
        .await?;
        let order = Self::row_to_order(&order_row)?;

        let item_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(order.id.as_i64())
        .bind(new.product_id.as_i64())
        .bind(new.quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PlacedOrder {
            item: OrderItem {
                id: OrderItemId::new(item_id),
                order_id: order.id,
                product_id: new.product_id,
                quantity: new.quantity,
            },
            order,
        })
    }

    async fn get_order_with_items(&self, id: OrderId) -> Result<Option<OrderWithItems>> {
        let row = sqlx::query(
            "SELECT id, customer, phone, address, created_at, status FROM orders WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = Self::row_to_order(&row)?;
        let items = self.items_for_orders(&[order.id.as_i64()]).await?;
        Ok(Self::assemble(vec![order], items).pop())
    }

    async fn list_orders(&self, req: &PageRequest) -> Result<Page<OrderWithItems>> {
        let pattern = like_pattern(req);

        let matching = r#"
            $1::text IS NULL OR EXISTS (
                SELECT 1 FROM order_items i
                JOIN products p ON p.id = i.product_id
                WHERE i.order_id = o.id AND p.name ILIKE $1
            )
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM orders o WHERE {matching}"
        ))
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT o.id, o.customer, o.phone, o.address, o.created_at, o.status
            FROM orders o
            WHERE {matching}
            ORDER BY o.id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&pattern)
        .bind(i64::from(PAGE_SIZE))
        .bind(req.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let items = self.items_for_orders(&ids).await?;

        Ok(Page::new(
            Self::assemble(orders, items),
            req.page_number(),
            total as u64,
        ))
    }

    async fn list_orders_for_customer(
        &self,
        customer: &str,
        req: &PageRequest,
    ) -> Result<Page<OrderWithItems>> {
        let pattern = like_pattern(req);

        let matching = r#"
            o.customer = $1 AND ($2::text IS NULL OR EXISTS (
                SELECT 1 FROM order_items i
                JOIN products p ON p.id = i.product_id
                WHERE i.order_id = o.id AND p.name ILIKE $2
            ))
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders o WHERE {matching}"))
                .bind(customer)
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT o.id, o.customer, o.phone, o.address, o.created_at, o.status
            FROM orders o
            WHERE {matching}
            ORDER BY o.id ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(customer)
        .bind(&pattern)
        .bind(i64::from(PAGE_SIZE))
        .bind(req.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let items = self.items_for_orders(&ids).await?;

        Ok(Page::new(
            Self::assemble(orders, items),
            req.page_number(),
            total as u64,
        ))
    }

    async fn update_order_status(&self, id: OrderId, status: &str) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", id.as_i64()));
        }
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        // Items go with the order via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", id.as_i64()));
        }
        Ok(())
    }

    async fn orders_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<OrderWithItems>> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer, phone, address, created_at, status
            FROM orders
            WHERE $1::timestamptz IS NULL OR created_at >= $1
            ORDER BY id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let items = self.items_for_orders(&ids).await?;
        Ok(Self::assemble(orders, items))
    }
}

#[async_trait]
impl Purchases for PostgresStore {
    async fn insert_purchase(&self, new: NewPurchase) -> Result<Purchase> {
        let row = sqlx::query(
            r#"
            INSERT INTO purchases
                (owner, phone, address, product_name, product_price,
                 product_category, product_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, owner, phone, address, created_at, product_name,
                      product_price, product_category, product_quantity, status
            "#,
        )
        .bind(&new.owner)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(&new.product_name)
        .bind(new.product_price)
        .bind(&new.product_category)
        .bind(new.product_quantity)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_purchase(row)
    }

    async fn get_purchase(&self, id: PurchaseId) -> Result<Option<Purchase>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner, phone, address, created_at, product_name,
                   product_price, product_category, product_quantity, status
            FROM purchases
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_purchase).transpose()
    }

    async fn list_purchases(&self, req: &PageRequest) -> Result<Page<Purchase>> {
        let pattern = like_pattern(req);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM purchases WHERE $1::text IS NULL OR product_name ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, owner, phone, address, created_at, product_name,
                   product_price, product_category, product_quantity, status
            FROM purchases
            WHERE $1::text IS NULL OR product_name ILIKE $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(i64::from(PAGE_SIZE))
        .bind(req.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(Self::row_to_purchase)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, req.page_number(), total as u64))
    }

    async fn update_purchase_status(&self, id: PurchaseId, status: &str) -> Result<()> {
        let result = sqlx::query("UPDATE purchases SET status = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("purchase", id.as_i64()));
        }
        Ok(())
    }

    async fn delete_purchase(&self, id: PurchaseId) -> Result<()> {
        let result = sqlx::query("DELETE FROM purchases WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("purchase", id.as_i64()));
        }
        Ok(())
    }

    async fn purchases_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Purchase>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner, phone, address, created_at, product_name,
                   product_price, product_category, product_quantity, status
            FROM purchases
            WHERE $1::timestamptz IS NULL OR created_at >= $1
            ORDER BY id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_purchase).collect()
    }
}

#[async_trait]
impl Accounts for PostgresStore {
    async fn insert_customer(&self, username: &str, password_hash: &str) -> Result<Customer> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::duplicate("customer", username);
            }
            StoreError::Database(e)
        })?;

        Self::row_to_customer(row)
    }

    async fn find_customer(&self, username: &str) -> Result<Option<Customer>> {
        let row =
            sqlx::query("SELECT id, username, password_hash FROM customers WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_customer).transpose()
    }
}
