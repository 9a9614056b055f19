use rust_decimal::Decimal;
use shared::models::{OrderStatus, PaymentStatus};
use thiserror::Error;

use crate::db::StorageError;
use crate::orders::OrderError;
use crate::utils::{AppError, ErrorCode};

/// Payment processor errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Order {order_id} is {status}, payment requires a pending order")]
    OrderNotPending { order_id: i64, status: OrderStatus },

    #[error("Payment {payment_id} is {status}: {reason}")]
    InvalidState {
        payment_id: i64,
        status: PaymentStatus,
        reason: String,
    },

    #[error("Amount mismatch: payment is {expected}, callback reported {reported}")]
    AmountMismatch { expected: Decimal, reported: Decimal },

    #[error("Insufficient amount: total is {required}, tendered {tendered}")]
    InsufficientAmount { required: Decimal, tendered: Decimal },

    #[error("Refund of {requested} exceeds the refundable {refundable}")]
    RefundExceedsAmount { refundable: Decimal, requested: Decimal },

    #[error("Order {0} is already paid")]
    AlreadyPaid(i64),

    /// Payment committed as completed, but the order could not be confirmed
    #[error("Payment {payment_id} completed but order {order_id} was not advanced: {reason}")]
    OrderNotAdvanced {
        payment_id: i64,
        order_id: i64,
        reason: String,
    },

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type PaymentResult<T> = Result<T, PaymentError>;

impl From<redb::CommitError> for PaymentError {
    fn from(err: redb::CommitError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        let message = err.to_string();
        match err {
            PaymentError::Validation(msg) => AppError::validation(msg),
            PaymentError::OrderNotFound(id) => AppError::with_message(ErrorCode::OrderNotFound, message)
                .with_detail("order_id", id),
            PaymentError::PaymentNotFound(reference) => {
                AppError::with_message(ErrorCode::PaymentNotFound, message)
                    .with_detail("payment", reference)
            }
            PaymentError::OrderNotPending { order_id, status } => {
                AppError::with_message(ErrorCode::OrderInvalidState, message)
                    .with_detail("order_id", order_id)
                    .with_detail("status", status.as_str())
            }
            PaymentError::InvalidState {
                payment_id, status, ..
            } => AppError::with_message(ErrorCode::PaymentInvalidState, message)
                .with_detail("payment_id", payment_id)
                .with_detail("status", status.as_str()),
            PaymentError::AmountMismatch { expected, reported } => {
                AppError::with_message(ErrorCode::PaymentAmountMismatch, message)
                    .with_detail("expected", expected.to_string())
                    .with_detail("reported", reported.to_string())
            }
            PaymentError::InsufficientAmount { required, tendered } => {
                AppError::with_message(ErrorCode::PaymentInsufficientAmount, message)
                    .with_detail("required", required.to_string())
                    .with_detail("tendered", tendered.to_string())
            }
            PaymentError::RefundExceedsAmount {
                refundable,
                requested,
            } => AppError::with_message(ErrorCode::ValidationFailed, message)
                .with_detail("refundable", refundable.to_string())
                .with_detail("requested", requested.to_string()),
            PaymentError::AlreadyPaid(order_id) => {
                AppError::with_message(ErrorCode::OrderAlreadyPaid, message)
                    .with_detail("order_id", order_id)
            }
            PaymentError::OrderNotAdvanced {
                payment_id,
                order_id,
                reason,
            } => AppError::with_message(ErrorCode::PaymentOrderNotAdvanced, message)
                .with_detail("payment_id", payment_id)
                .with_detail("order_id", order_id)
                .with_detail("payment_status", PaymentStatus::Completed.as_str())
                .with_detail("order_advanced", false)
                .with_detail("reason", reason),
            PaymentError::Order(e) => e.into(),
            PaymentError::Storage(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_partial_success_is_207() {
        let app: AppError = PaymentError::OrderNotAdvanced {
            payment_id: 3,
            order_id: 9,
            reason: "Invalid status transition from cancelled to confirmed".into(),
        }
        .into();
        assert_eq!(app.code, ErrorCode::PaymentOrderNotAdvanced);
        assert_eq!(app.http_status(), StatusCode::MULTI_STATUS);

        let details = app.details.unwrap();
        assert_eq!(details["payment_id"], 3);
        assert_eq!(details["order_id"], 9);
        assert_eq!(details["payment_status"], "completed");
        assert_eq!(details["order_advanced"], false);
    }

    #[test]
    fn test_client_errors() {
        let cases: Vec<(PaymentError, StatusCode)> = vec![
            (PaymentError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (PaymentError::PaymentNotFound("TX".into()), StatusCode::NOT_FOUND),
            (PaymentError::OrderNotFound(1), StatusCode::NOT_FOUND),
            (PaymentError::AlreadyPaid(1), StatusCode::CONFLICT),
            (
                PaymentError::AmountMismatch {
                    expected: Decimal::new(2750, 2),
                    reported: Decimal::new(100, 2),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                PaymentError::RefundExceedsAmount {
                    refundable: Decimal::ONE,
                    requested: Decimal::TWO,
                },
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            let app: AppError = err.into();
            assert_eq!(app.http_status(), status, "{}", app.message);
        }
    }

    #[test]
    fn test_refund_over_limit_is_validation() {
        let app: AppError = PaymentError::RefundExceedsAmount {
            refundable: Decimal::new(1750, 2),
            requested: Decimal::new(2000, 2),
        }
        .into();
        assert_eq!(app.code, ErrorCode::ValidationFailed);
        let details = app.details.unwrap();
        assert_eq!(details["refundable"], "17.50");
        assert_eq!(details["requested"], "20.00");
    }

    #[test]
    fn test_insufficient_amount_details() {
        let app: AppError = PaymentError::InsufficientAmount {
            required: Decimal::new(2750, 2),
            tendered: Decimal::new(2000, 2),
        }
        .into();
        assert_eq!(app.code, ErrorCode::PaymentInsufficientAmount);
        assert_eq!(app.details.unwrap()["tendered"], "20.00");
    }
}
