//! 支付处理
//!
//! - [`PaymentService`] - QR 支付发起、回调校验、现金收款、退款、交班对账
//! - [`txn`] - 交易号与 QR 载荷
//! - [`PaymentError`] - 支付错误，转换为 [`AppError`](crate::utils::AppError)

pub mod error;
pub mod service;
pub mod txn;


pub use error::{PaymentError, PaymentResult};
pub use service::{PaymentService, map_reported_status};
