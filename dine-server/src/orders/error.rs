use shared::models::OrderStatus;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::db::StorageError;
use crate::utils::{AppError, ErrorCode};

/// Order aggregate errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    NotFound(i64),

    #[error("Menu item {0} not found")]
    MenuItemNotFound(i64),

    #[error("Menu item '{name}' is not available")]
    MenuItemUnavailable { menu_item_id: i64, name: String },

    /// Line or order amount does not fit in a decimal
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    #[error("Order {order_id} is {status}: {reason}")]
    InvalidState {
        order_id: i64,
        status: OrderStatus,
        reason: String,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type OrderResult<T> = Result<T, OrderError>;

// redb transaction/commit errors surface through StorageError
impl From<redb::TransactionError> for OrderError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::CommitError> for OrderError {
    fn from(err: redb::CommitError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::NotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
                    .with_detail("order_id", id)
            }
            OrderError::MenuItemNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, err.to_string())
                    .with_detail("menu_item_id", id)
            }
            OrderError::MenuItemUnavailable { menu_item_id, .. } => {
                AppError::with_message(ErrorCode::ProductUnavailable, err.to_string())
                    .with_detail("menu_item_id", menu_item_id)
            }
            OrderError::AmountOverflow(_) => AppError::validation(err.to_string()),
            OrderError::InvalidState {
                order_id,
                status,
                ref reason,
            } => AppError::with_message(ErrorCode::OrderInvalidState, err.to_string())
                .with_detail("order_id", order_id)
                .with_detail("status", status.as_str())
                .with_detail("reason", reason.clone()),
            OrderError::InvalidTransition { from, to } => {
                AppError::with_message(ErrorCode::OrderInvalidTransition, err.to_string())
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            OrderError::Catalog(e) => e.into(),
            OrderError::Storage(e) => e.into(),
        }
    }
}
