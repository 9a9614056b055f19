//! Kitchen API Module
//!
//! | 路径 | 方法 | 说明 | 权限 |
//! |------|------|------|------|
//! | /api/kitchen/orders | GET | 当前厨房快照 + 在线显示数 | 任意身份 |
//! | /api/kitchen/broadcast | POST | 重新广播某订单 | 员工 |
//! | /api/kitchen/updates | GET (WebSocket) | 实时推送 | 任意身份 |
//!
//! WebSocket 协议:
//! - Server → Display: `KitchenMessage` JSON (首条为 `initial_orders`)
//! - Display → Server: `"ping"` → `"pong"`

mod handler;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};

use crate::auth::require_staff;
use crate::core::ServerState;

/// Kitchen router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/kitchen", routes())
}

fn routes() -> Router<ServerState> {
    let open = Router::new()
        .route("/orders", get(handler::snapshot))
        .route("/updates", get(handler::updates));

    let staff = Router::new()
        .route("/broadcast", post(handler::broadcast))
        .route_layer(middleware::from_fn(require_staff));

    open.merge(staff)
}
