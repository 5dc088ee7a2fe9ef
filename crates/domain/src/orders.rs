//! Order service, including the order placement transaction.

use common::{OrderId, Page, PageRequest, ProductId};
use store::{NewOrder, Orders, OrderWithItems, PlacedOrder};

use crate::status::OrderStatus;
use crate::DomainError;

/// Fields submitted when placing an order, before validation.
#[derive(Debug, Clone)]
pub struct PlaceOrderInput {
    pub customer: String,
    pub phone: String,
    pub address: String,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Service for placing and managing orders.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S: Orders> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order: validates the input, then atomically creates
    /// the order with its single line item and decrements the product
    /// stock. Either all three effects commit or none do.
    #[tracing::instrument(skip(self, input), fields(product_id = %input.product_id, quantity = input.quantity))]
    pub async fn place_order(&self, input: PlaceOrderInput) -> Result<PlacedOrder, DomainError> {
        let customer = input.customer.trim();
        let phone = input.phone.trim();
        let address = input.address.trim();

        if customer.is_empty() || phone.is_empty() || address.is_empty() {
            return Err(DomainError::validation(
                "customer, phone, and address are all required",
            ));
        }
        if input.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let result = self
            .store
            .place_order(NewOrder {
                customer: customer.to_string(),
                phone: phone.to_string(),
                address: address.to_string(),
                product_id: input.product_id,
                quantity: input.quantity,
            })
            .await;

        match &result {
            Ok(placed) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(order_id = %placed.order.id, "order placed");
            }
            Err(_) => {
                metrics::counter!("orders_rejected_total").increment(1);
            }
        }

        Ok(result?)
    }

    /// Loads one order with its items.
    pub async fn get_order(&self, id: OrderId) -> Result<OrderWithItems, DomainError> {
        self.store
            .get_order_with_items(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))
    }

    /// Lists orders with items, filtered by product-name substring.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, req: &PageRequest) -> Result<Page<OrderWithItems>, DomainError> {
        Ok(self.store.list_orders(req).await?)
    }

    /// Lists one customer's orders, same filtering as [`Self::list_orders`].
    #[tracing::instrument(skip(self))]
    pub async fn list_for_customer(
        &self,
        customer: &str,
        req: &PageRequest,
    ) -> Result<Page<OrderWithItems>, DomainError> {
        Ok(self.store.list_orders_for_customer(customer, req).await?)
    }

    /// Updates an order's status. The new value must belong to the
    /// closed status set and must not move the order backwards.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<(), DomainError> {
        let next: OrderStatus = status.parse()?;
        let current: OrderStatus = self.get_order(id).await?.order.status.parse()?;

        if !current.can_transition_to(next) {
            return Err(DomainError::validation(format!(
                "order status cannot move from {current} back to {next}"
            )));
        }

        self.store.update_order_status(id, next.as_str()).await?;
        tracing::info!(order_id = %id, status = %next, "order status updated");
        Ok(())
    }

    /// Deletes an order and its items.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), DomainError> {
        self.store.delete_order(id).await?;
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }
}
