//! Payment API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::{
    CashPaymentReceipt, CashPaymentRequest, CashReconciliation, InitiateQrisRequest,
    OrderPayments, Payment, PaymentVerification, QrisPayment, ReconcileCashRequest,
    RefundRequest, VerifyPaymentRequest,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ReconciliationQuery {
    #[serde(default)]
    pub cashier_id: Option<i64>,
}

/// 顾客只能访问自己订单的支付
fn ensure_order_visible(state: &ServerState, user: &CurrentUser, order_id: i64) -> AppResult<()> {
    if user.is_staff() {
        return Ok(());
    }
    let order = state.orders.get(order_id)?;
    if order.user_id == user.id {
        Ok(())
    } else {
        Err(AppError::permission_denied(format!(
            "Order {order_id} belongs to another customer"
        )))
    }
}

/// Start a digital payment for the order total
pub async fn initiate_qris(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<InitiateQrisRequest>,
) -> AppResult<(StatusCode, Json<QrisPayment>)> {
    ensure_order_visible(&state, &user, payload.order_id)?;
    let qris = state.payments.initiate_digital(payload.order_id)?;
    Ok((StatusCode::CREATED, Json(qris)))
}

/// Provider callback (no identity headers)
pub async fn webhook(
    State(state): State<ServerState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<PaymentVerification>> {
    tracing::info!(transaction_id = %payload.transaction_id, status = %payload.status, "Payment callback received");
    Ok(Json(state.payments.verify(payload)?))
}

/// Manual verification by staff
pub async fn verify(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<PaymentVerification>> {
    tracing::info!(transaction_id = %payload.transaction_id, by = user.id, "Manual payment verification");
    Ok(Json(state.payments.verify(payload)?))
}

pub async fn cash(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CashPaymentRequest>,
) -> AppResult<Json<CashPaymentReceipt>> {
    Ok(Json(state.payments.process_cash(&user, payload)?))
}

pub async fn refund(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<Payment>> {
    Ok(Json(state.payments.refund(&user, id, payload)?))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Payment>> {
    let payment = state.payments.get(id)?;
    ensure_order_visible(&state, &user, payment.order_id)?;
    Ok(Json(payment))
}

pub async fn get_by_transaction(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(transaction_id): Path<String>,
) -> AppResult<Json<Payment>> {
    let payment = state.payments.get_by_transaction(&transaction_id)?;
    ensure_order_visible(&state, &user, payment.order_id)?;
    Ok(Json(payment))
}

/// All payment records of an order, with the net collected
pub async fn order_payments(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<OrderPayments>> {
    ensure_order_visible(&state, &user, order_id)?;
    Ok(Json(state.payments.order_payments(order_id)?))
}

/// End-of-shift cash reconciliation
pub async fn reconcile(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ReconcileCashRequest>,
) -> AppResult<(StatusCode, Json<CashReconciliation>)> {
    let record = state.payments.reconcile_cash_shift(&user, payload)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_reconciliations(
    State(state): State<ServerState>,
    Query(query): Query<ReconciliationQuery>,
) -> AppResult<Json<Vec<CashReconciliation>>> {
    Ok(Json(state.payments.list_reconciliations(query.cashier_id)?))
}
