//! 订单聚合
//!
//! - [`OrderService`] - 创建、状态流转、改单、软删除、查询
//! - [`money`] - 小计 / 税 / 总额计算 (rust_decimal)
//! - [`OrderError`] - 订单错误，转换为 [`AppError`](crate::utils::AppError)

pub mod error;
pub mod money;
pub mod service;


pub use error::{OrderError, OrderResult};
pub use service::{OrderService, parse_status};
