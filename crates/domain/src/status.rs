//! Closed status sets for orders and purchases.
//!
//! Statuses are stored as plain strings in the database but validated
//! against these enums on every write, with forward-only transitions.

use std::str::FromStr;

use crate::DomainError;

/// Lifecycle of a sales order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Done,
}

impl OrderStatus {
    /// The string stored in the `orders.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Done => "done",
        }
    }

    /// Whether the status may move from `self` to `next`. Orders only
    /// move forward; re-asserting the current status is a no-op and
    /// allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        next >= *self
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "done" => Ok(OrderStatus::Done),
            other => Err(DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a purchase (restock) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PurchaseStatus {
    Pending,
    Ordered,
    Received,
}

impl PurchaseStatus {
    /// The string stored in the `purchases.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Ordered => "ordered",
            PurchaseStatus::Received => "received",
        }
    }

    /// Forward-only, same as order statuses.
    pub fn can_transition_to(&self, next: PurchaseStatus) -> bool {
        next >= *self
    }
}

impl FromStr for PurchaseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "ordered" => Ok(PurchaseStatus::Ordered),
            "received" => Ok(PurchaseStatus::Received),
            other => Err(DomainError::validation(format!(
                "unknown purchase status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
