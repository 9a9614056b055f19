//! Order API Module
//!
//! | 路径 | 方法 | 说明 | 权限 |
//! |------|------|------|------|
//! | /api/orders | POST | 下单 (201) | 任意身份 |
//! | /api/orders | GET | 订单列表 (?status=&order_type=) | 顾客只看自己的 |
//! | /api/orders/ready-takeaway | GET | 待取外带单 | 任意身份 |
//! | /api/orders/user/{user_id} | GET | 某用户的订单 | 本人或员工 |
//! | /api/orders/{id} | GET | 订单详情 | 本人或员工 |
//! | /api/orders/{id} | PATCH | 改单 (OrderAmendment) | 本人或员工 |
//! | /api/orders/{id} | DELETE | 软删除 | 员工 |
//! | /api/orders/{id}/status | PATCH | 状态流转 | 员工 (顾客仅可取消) |
//! | /api/orders/{id}/items | PUT | 替换菜品行 | 本人或员工 |

mod handler;

use axum::{
    Router,
    routing::{get, patch, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 按资源归属检查权限，在 handler 内完成
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/ready-takeaway", get(handler::ready_takeaway))
        .route("/user/{user_id}", get(handler::list_by_user))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::amend)
                .delete(handler::soft_delete),
        )
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/items", put(handler::update_items))
}
