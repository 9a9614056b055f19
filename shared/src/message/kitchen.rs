//! Kitchen display messages
//!
//! Wire format (internally tagged by `type`):
//!
//! ```json
//! { "type": "initial_orders", "orders": [ ... ] }
//! { "type": "status_update", "order_id": 42, "order": { ... }, "status": "preparing" }
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderStatus};

/// One order state change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitchenUpdate {
    pub order_id: i64,
    pub order: Order,
    pub status: OrderStatus,
}

/// Messages pushed to kitchen displays
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KitchenMessage {
    /// Snapshot sent once on connect: every confirmed/preparing order
    InitialOrders { orders: Vec<Order> },
    NewOrder(KitchenUpdate),
    StatusUpdate(KitchenUpdate),
    OrderReady(KitchenUpdate),
    OrderCancelled(KitchenUpdate),
}

/// Event kinds carrying a single order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KitchenEventKind {
    NewOrder,
    StatusUpdate,
    OrderReady,
    OrderCancelled,
}

impl KitchenEventKind {
    /// Kind implied by the status an order just reached
    pub fn for_status(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Confirmed => Self::NewOrder,
            OrderStatus::Ready => Self::OrderReady,
            OrderStatus::Cancelled => Self::OrderCancelled,
            _ => Self::StatusUpdate,
        }
    }
}

impl KitchenMessage {
    /// Build the event for an order that just reached its current status
    pub fn for_order(order: Order) -> Self {
        let kind = KitchenEventKind::for_status(order.status);
        Self::with_kind(kind, order)
    }

    pub fn with_kind(kind: KitchenEventKind, order: Order) -> Self {
        let update = KitchenUpdate {
            order_id: order.id,
            status: order.status,
            order,
        };
        match kind {
            KitchenEventKind::NewOrder => Self::NewOrder(update),
            KitchenEventKind::StatusUpdate => Self::StatusUpdate(update),
            KitchenEventKind::OrderReady => Self::OrderReady(update),
            KitchenEventKind::OrderCancelled => Self::OrderCancelled(update),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::InitialOrders { .. } => "initial_orders",
            Self::NewOrder(_) => "new_order",
            Self::StatusUpdate(_) => "status_update",
            Self::OrderReady(_) => "order_ready",
            Self::OrderCancelled(_) => "order_cancelled",
        }
    }

    pub fn order_id(&self) -> Option<i64> {
        match self {
            Self::InitialOrders { .. } => None,
            Self::NewOrder(u) | Self::StatusUpdate(u) | Self::OrderReady(u) | Self::OrderCancelled(u) => {
                Some(u.order_id)
            }
        }
    }
}
