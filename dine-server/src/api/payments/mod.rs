//! Payment API Module
//!
//! | 路径 | 方法 | 说明 | 权限 |
//! |------|------|------|------|
//! | /api/payments/qris | POST | 发起 QR 支付 (201) | 本人或员工 |
//! | /api/payments/webhook | POST | 支付回调 | 公开 |
//! | /api/payments/verify | POST | 手动校验 | 员工 |
//! | /api/payments/cash | POST | 现金收款 | 收银 |
//! | /api/payments/{id}/refund | POST | 退款 | 员工 |
//! | /api/payments/{id} | GET | 支付详情 | 本人或员工 |
//! | /api/payments/transaction/{tx} | GET | 按交易号查询 | 本人或员工 |
//! | /api/payments/order/{order_id} | GET | 订单支付记录 | 本人或员工 |
//! | /api/payments/reconciliations | POST / GET | 交班对账 | 收银 |
//!
//! 校验结果中支付已完成、订单未推进时返回 207。

mod handler;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};

use crate::auth::{require_cashier, require_staff};
use crate::core::ServerState;

/// Payment router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    let open = Router::new()
        .route("/qris", post(handler::initiate_qris))
        .route("/webhook", post(handler::webhook))
        .route("/{id}", get(handler::get_by_id))
        .route("/transaction/{transaction_id}", get(handler::get_by_transaction))
        .route("/order/{order_id}", get(handler::order_payments));

    let staff = Router::new()
        .route("/verify", post(handler::verify))
        .route("/{id}/refund", post(handler::refund))
        .route_layer(middleware::from_fn(require_staff));

    let cashier = Router::new()
        .route("/cash", post(handler::cash))
        .route(
            "/reconciliations",
            get(handler::list_reconciliations).post(handler::reconcile),
        )
        .route_layer(middleware::from_fn(require_cashier));

    open.merge(staff).merge(cashier)
}
