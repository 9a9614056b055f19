//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::{
    CreateOrderRequest, Order, OrderAmendment, OrderFilter, OrderStatus, OrderType,
    UpdateItemsRequest, UpdateStatusRequest,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::parse_status;
use crate::utils::{AppError, AppResult};

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub order_type: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> AppResult<OrderFilter> {
        let status = self.status.as_deref().map(parse_status).transpose()?;
        let order_type = self
            .order_type
            .as_deref()
            .map(|raw| raw.trim().to_ascii_lowercase().parse::<OrderType>())
            .transpose()
            .map_err(|e| AppError::validation(format!("Invalid order type: {}", e.0)))?;
        Ok(OrderFilter { status, order_type })
    }
}

/// 顾客只能访问自己的订单
fn ensure_visible(user: &CurrentUser, order: &Order) -> AppResult<()> {
    if user.is_staff() || order.user_id == user.id {
        Ok(())
    } else {
        Err(AppError::permission_denied(format!(
            "Order {} belongs to another customer",
            order.id
        )))
    }
}

/// 顾客对自己的订单只允许取消
fn ensure_may_set_status(user: &CurrentUser, target: OrderStatus) -> AppResult<()> {
    if user.is_staff() || target == OrderStatus::Cancelled {
        Ok(())
    } else {
        user.require_staff()
    }
}

/// Create order
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = state.orders.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List live orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let filter = query.into_filter()?;
    let mut orders = state.orders.list(&filter)?;
    if !user.is_staff() {
        orders.retain(|order| order.user_id == user.id);
    }
    Ok(Json(orders))
}

pub async fn list_by_user(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Order>>> {
    if !user.is_staff() && user.id != user_id {
        return Err(AppError::permission_denied("Cannot list another customer's orders"));
    }
    Ok(Json(state.orders.list_by_user(user_id)?))
}

pub async fn ready_takeaway(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.ready_takeaway()?))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get(id)?;
    ensure_visible(&user, &order)?;
    Ok(Json(order))
}

/// Move an order along the status table
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    let target = parse_status(&payload.status)?;
    ensure_visible(&user, &state.orders.get(id)?)?;
    ensure_may_set_status(&user, target)?;
    Ok(Json(state.orders.update_status(id, target)?))
}

/// Replace the line items of a pending order
pub async fn update_items(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateItemsRequest>,
) -> AppResult<Json<Order>> {
    ensure_visible(&user, &state.orders.get(id)?)?;
    Ok(Json(state.orders.update_items(id, payload.items).await?))
}

/// Apply one tagged amendment
pub async fn amend(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(amendment): Json<OrderAmendment>,
) -> AppResult<Json<Order>> {
    ensure_visible(&user, &state.orders.get(id)?)?;
    if let OrderAmendment::Status { status } = &amendment {
        ensure_may_set_status(&user, *status)?;
    }
    Ok(Json(state.orders.amend(id, amendment).await?))
}

/// Soft delete (staff only)
pub async fn soft_delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    user.require_staff()?;
    let order = state.orders.soft_delete(id)?;
    tracing::info!(order_id = id, by = user.id, "Order deleted via API");
    Ok(Json(order))
}
