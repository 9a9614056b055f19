//! Order Model
//!
//! # Status machine
//!
//! ```text
//! pending ──▶ confirmed ──▶ preparing ──▶ ready ──▶ served
//!    │            │
//!    └────────────┴──▶ cancelled
//! ```
//!
//! `served` and `cancelled` are terminal. Self-transitions and skips
//! (e.g. `pending -> preparing`) are rejected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the order is eaten
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeaway,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DineIn => "dine_in",
            Self::Takeaway => "takeaway",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dine_in" => Ok(Self::DineIn),
            "takeaway" => Ok(Self::Takeaway),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Served,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Served => "served",
            Self::Cancelled => "cancelled",
        }
    }

    /// Valid next statuses. Empty for terminal statuses.
    pub fn successors(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Preparing, Self::Cancelled],
            Self::Preparing => &[Self::Ready],
            Self::Ready => &[Self::Served],
            Self::Served | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    /// Statuses shown on the kitchen display
    pub fn is_kitchen_active(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Preparing)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Returned when parsing an enum from an unrecognized string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

/// Order line item
///
/// `unit_price` is frozen from the catalog at the time the line was priced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// 1-based position within the order
    pub line_no: u32,
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub special_requests: Option<String>,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    /// Owning user (customer or the cashier who entered it)
    pub user_id: i64,
    pub table_id: Option<i64>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    /// Set only for cashier-entered orders
    pub cashier_name: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    /// Takeaway only, Unix millis
    pub estimated_ready_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl Order {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// ========== Requests ==========

/// Requested line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: i64,
    pub quantity: i32,
    #[serde(default)]
    pub special_requests: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub order_type: OrderType,
    #[serde(default)]
    pub table_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Takeaway only, Unix millis
    #[serde(default)]
    pub estimated_ready_at: Option<i64>,
    pub items: Vec<OrderItemInput>,
}

/// Status change payload
///
/// The status is kept as a string so an unknown value is reported as a
/// validation error rather than a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Replace line items payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemsRequest {
    pub items: Vec<OrderItemInput>,
}

/// A single, explicitly typed change to an order
///
/// ```json
/// { "kind": "status", "status": "confirmed" }
/// { "kind": "items", "items": [{ "menu_item_id": 1, "quantity": 2 }] }
/// { "kind": "notes", "notes": "no onions" }
/// { "kind": "customer", "customer_name": "Ana", "customer_phone": "0812" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderAmendment {
    Status {
        status: OrderStatus,
    },
    Items {
        items: Vec<OrderItemInput>,
    },
    Notes {
        notes: Option<String>,
    },
    Customer {
        #[serde(default)]
        customer_name: Option<String>,
        #[serde(default)]
        customer_phone: Option<String>,
    },
}

/// Order list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub order_type: Option<OrderType>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| s == order.status)
            && self.order_type.is_none_or(|t| t == order.order_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;
        let allowed = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Preparing),
            (Confirmed, Cancelled),
            (Preparing, Ready),
            (Ready, Served),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Served.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
        assert!(OrderStatus::Confirmed.is_kitchen_active());
        assert!(OrderStatus::Preparing.is_kitchen_active());
        assert!(!OrderStatus::Ready.is_kitchen_active());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("ready".parse::<OrderStatus>(), Ok(OrderStatus::Ready));
        assert_eq!(
            "READY".parse::<OrderStatus>(),
            Err(UnknownVariant("READY".into()))
        );
        assert_eq!("dine_in".parse::<OrderType>(), Ok(OrderType::DineIn));
        assert!("delivery".parse::<OrderType>().is_err());
    }

    #[test]
    fn test_amendment_tagging() {
        let amendment: OrderAmendment =
            serde_json::from_str(r#"{"kind":"status","status":"confirmed"}"#).unwrap();
        assert!(matches!(
            amendment,
            OrderAmendment::Status {
                status: OrderStatus::Confirmed
            }
        ));

        let amendment: OrderAmendment =
            serde_json::from_str(r#"{"kind":"customer","customer_phone":"0812"}"#).unwrap();
        match amendment {
            OrderAmendment::Customer {
                customer_name,
                customer_phone,
            } => {
                assert!(customer_name.is_none());
                assert_eq!(customer_phone.as_deref(), Some("0812"));
            }
            other => panic!("unexpected amendment: {other:?}"),
        }

        assert!(serde_json::from_str::<OrderAmendment>(r#"{"kind":"price","total":"0"}"#).is_err());
    }
}
