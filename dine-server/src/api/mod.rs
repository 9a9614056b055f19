//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查 (公开)
//! - [`orders`] - 订单接口
//! - [`payments`] - 支付、退款、对账接口
//! - [`kitchen`] - 厨房快照、手动广播、WebSocket 推送
//!
//! `/api/*` 统一经过 [`require_identity`](crate::auth::require_identity)，
//! 支付回调除外。

pub mod health;
pub mod kitchen;
pub mod orders;
pub mod payments;

use axum::{Router, middleware};

use crate::auth::require_identity;
use crate::core::ServerState;

/// Build the full application router
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(kitchen::router())
        .layer(middleware::from_fn(require_identity))
        .with_state(state)
}
