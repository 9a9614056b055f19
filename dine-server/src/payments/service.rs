//! Payment processor
//!
//! # Atomicity
//!
//! | Operation | Transactions |
//! |-----------|--------------|
//! | cash payment | payment insert + order `pending → confirmed` in one write transaction |
//! | verification | payment status (txn 1), then order advance (txn 2) |
//! | refund | refund record + original status in one write transaction |
//!
//! A verification whose order advance fails after the payment committed is
//! reported as [`PaymentError::OrderNotAdvanced`] and logged at error level
//! for manual reconciliation. It is never retried silently.

use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::models::{
    CashPaymentReceipt, CashPaymentRequest, CashReconciliation, Order, OrderPayments,
    OrderStatus, Payment, PaymentMethod, PaymentStatus, PaymentVerification, QrisPayment,
    ReconcileCashRequest, RefundRequest, VerifyPaymentRequest,
};
use shared::util::{minutes_millis, now_millis};

use super::error::{PaymentError, PaymentResult};
use super::txn::{generate_transaction_id, qr_payload, refund_transaction_id};
use crate::auth::CurrentUser;
use crate::core::config::QrisConfig;
use crate::db::{PAYMENT_SEQ, RECONCILIATION_SEQ, Storage};
use crate::orders::OrderService;
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, non_blank, validate_optional_text, validate_required_text,
};

/// Map a provider status string onto a terminal payment status
///
/// Accepts `success`/`completed` and `failed`, case-insensitively.
pub fn map_reported_status(raw: &str) -> PaymentResult<PaymentStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "success" | "completed" => Ok(PaymentStatus::Completed),
        "failed" => Ok(PaymentStatus::Failed),
        _ => Err(PaymentError::Validation(format!(
            "Invalid payment status: {raw}"
        ))),
    }
}

#[derive(Clone)]
pub struct PaymentService {
    storage: Storage,
    orders: OrderService,
    qris: QrisConfig,
}

impl std::fmt::Debug for PaymentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentService")
            .field("merchant_id", &self.qris.merchant_id)
            .finish_non_exhaustive()
    }
}

impl PaymentService {
    pub fn new(storage: Storage, orders: OrderService, qris: QrisConfig) -> Self {
        Self {
            storage,
            orders,
            qris,
        }
    }

    // ========== Digital ==========

    /// Create a pending QR payment for the order's current total
    ///
    /// An older pending digital payment of the same order is cancelled in the
    /// same transaction. The order status is not touched.
    pub fn initiate_digital(&self, order_id: i64) -> PaymentResult<QrisPayment> {
        let txn = self.storage.begin_write()?;
        let order = self.load_payable_order(&txn, order_id)?;
        let now = now_millis();
        let superseded = self.supersede_pending_digital(&txn, order_id, now)?;

        let transaction_id = self.unique_transaction_id(&txn)?;
        let payload = qr_payload(
            &self.qris.merchant_id,
            order.total,
            &transaction_id,
            &self.qris.callback_url,
        );
        let expires_at = now + minutes_millis(self.qris.expiry_minutes);

        let payment = Payment {
            id: self.storage.next_id(&txn, PAYMENT_SEQ)?,
            order_id,
            method: PaymentMethod::Qris,
            status: PaymentStatus::Pending,
            amount: order.total,
            transaction_id,
            external_id: None,
            qr_payload: Some(payload.clone()),
            expires_at: Some(expires_at),
            processed_by: None,
            amount_tendered: None,
            change_given: None,
            refund_of: None,
            refund_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        self.storage.put_payment(&txn, &payment)?;
        txn.commit()?;

        tracing::info!(
            payment_id = payment.id,
            order_id,
            transaction_id = %payment.transaction_id,
            amount = %payment.amount,
            superseded,
            "Digital payment initiated"
        );
        Ok(QrisPayment {
            payment_id: payment.id,
            order_id,
            transaction_id: payment.transaction_id,
            qr_payload: payload,
            amount: payment.amount,
            expires_at,
        })
    }

    /// Apply a provider callback
    ///
    /// Check order: transaction lookup, amount, status mapping. A replay of
    /// the status a payment already holds is answered without side effects.
    /// `expires_at` is not enforced here; a newer initiation supersedes instead.
    pub fn verify(&self, req: VerifyPaymentRequest) -> PaymentResult<PaymentVerification> {
        let external_id = non_blank(&req.external_id).map(str::to_string);
        validate_optional_text(&external_id, "external_id", MAX_SHORT_TEXT_LEN)
            .map_err(PaymentError::Validation)?;

        // Phase 1: payment status
        let txn = self.storage.begin_write()?;
        let mut payment = self
            .storage
            .find_payment_by_txn_txn(&txn, &req.transaction_id)?
            .ok_or_else(|| PaymentError::PaymentNotFound(req.transaction_id.clone()))?;
        if req.amount != payment.amount {
            tracing::warn!(
                transaction_id = %req.transaction_id,
                expected = %payment.amount,
                reported = %req.amount,
                "Rejected payment callback: amount mismatch"
            );
            return Err(PaymentError::AmountMismatch {
                expected: payment.amount,
                reported: req.amount,
            });
        }
        let target = map_reported_status(&req.status)?;

        if payment.status.is_terminal() {
            if payment.status == target {
                tracing::info!(
                    payment_id = payment.id,
                    status = %payment.status,
                    "Repeated payment callback ignored"
                );
                return Ok(PaymentVerification {
                    payment,
                    order: None,
                    order_advanced: false,
                });
            }
            tracing::warn!(
                payment_id = payment.id,
                status = %payment.status,
                reported = %target,
                "Rejected payment callback: payment already settled"
            );
            return Err(PaymentError::InvalidState {
                payment_id: payment.id,
                status: payment.status,
                reason: format!("cannot become {target}"),
            });
        }

        let now = now_millis();
        payment.status = target;
        payment.external_id = external_id;
        payment.updated_at = now;
        if target == PaymentStatus::Completed {
            payment.completed_at = Some(now);
        }
        self.storage.put_payment(&txn, &payment)?;
        txn.commit()?;

        tracing::info!(
            payment_id = payment.id,
            order_id = payment.order_id,
            status = %payment.status,
            "Payment verified"
        );

        if target != PaymentStatus::Completed {
            return Ok(PaymentVerification {
                payment,
                order: None,
                order_advanced: false,
            });
        }

        // Phase 2: order advance, causally after the committed payment
        match self
            .orders
            .update_status(payment.order_id, OrderStatus::Confirmed)
        {
            Ok(order) => Ok(PaymentVerification {
                payment,
                order: Some(order),
                order_advanced: true,
            }),
            Err(e) => {
                tracing::error!(
                    payment_id = payment.id,
                    order_id = payment.order_id,
                    error = %e,
                    "Payment completed but order was not advanced, manual reconciliation required"
                );
                Err(PaymentError::OrderNotAdvanced {
                    payment_id: payment.id,
                    order_id: payment.order_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    // ========== Cash ==========

    /// Record a completed cash payment and confirm the order atomically
    pub fn process_cash(
        &self,
        cashier: &CurrentUser,
        req: CashPaymentRequest,
    ) -> PaymentResult<CashPaymentReceipt> {
        if req.amount_tendered.is_sign_negative() {
            return Err(PaymentError::Validation(
                "amount_tendered must not be negative".into(),
            ));
        }

        let txn = self.storage.begin_write()?;
        let order = self.load_payable_order(&txn, req.order_id)?;
        if req.amount_tendered < order.total {
            return Err(PaymentError::InsufficientAmount {
                required: order.total,
                tendered: req.amount_tendered,
            });
        }
        let change = req.amount_tendered - order.total;
        match req.change_given {
            Some(reported) if reported != change => {
                return Err(PaymentError::Validation(format!(
                    "change_given {reported} does not match computed change {change}"
                )));
            }
            _ => {}
        }

        let now = now_millis();
        self.supersede_pending_digital(&txn, order.id, now)?;
        let payment = Payment {
            id: self.storage.next_id(&txn, PAYMENT_SEQ)?,
            order_id: order.id,
            method: PaymentMethod::Cash,
            status: PaymentStatus::Completed,
            amount: order.total,
            transaction_id: self.unique_transaction_id(&txn)?,
            external_id: None,
            qr_payload: None,
            expires_at: None,
            processed_by: Some(cashier.id),
            amount_tendered: Some(req.amount_tendered),
            change_given: Some(change),
            refund_of: None,
            refund_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: Some(now),
        };
        self.storage.put_payment(&txn, &payment)?;
        let order = self
            .orders
            .transition_in_txn(&txn, order.id, OrderStatus::Confirmed)?;
        txn.commit()?;

        tracing::info!(
            payment_id = payment.id,
            order_id = order.id,
            cashier_id = cashier.id,
            amount = %payment.amount,
            change = %change,
            "Cash payment recorded"
        );
        self.orders.kitchen().notify_order(&order);

        Ok(CashPaymentReceipt {
            payment,
            order,
            change_given: change,
        })
    }

    // ========== Refund ==========

    /// Add a negative payment record against a completed payment
    ///
    /// Cumulative refunds never exceed the original amount; reaching it marks
    /// the original `refunded`. The order is not touched.
    pub fn refund(
        &self,
        initiator: &CurrentUser,
        payment_id: i64,
        req: RefundRequest,
    ) -> PaymentResult<Payment> {
        validate_required_text(&req.reason, "reason", MAX_NOTE_LEN).map_err(PaymentError::Validation)?;
        if req.amount <= Decimal::ZERO {
            return Err(PaymentError::Validation(
                "refund amount must be greater than zero".into(),
            ));
        }

        let txn = self.storage.begin_write()?;
        let mut original = self
            .storage
            .get_payment_txn(&txn, payment_id)?
            .ok_or_else(|| PaymentError::PaymentNotFound(payment_id.to_string()))?;
        if original.is_refund() {
            return Err(PaymentError::Validation(
                "refund records cannot be refunded".into(),
            ));
        }
        if original.status != PaymentStatus::Completed {
            return Err(PaymentError::InvalidState {
                payment_id,
                status: original.status,
                reason: "only completed payments can be refunded".into(),
            });
        }

        let prior: Vec<Payment> = self
            .storage
            .payments_for_order_txn(&txn, original.order_id)?
            .into_iter()
            .filter(|p| p.refund_of == Some(original.id))
            .collect();
        let already_refunded: Decimal = prior.iter().map(|p| -p.amount).sum();
        let refundable = original.amount - already_refunded;
        if req.amount > refundable {
            return Err(PaymentError::RefundExceedsAmount {
                refundable,
                requested: req.amount,
            });
        }

        let now = now_millis();
        let refund = Payment {
            id: self.storage.next_id(&txn, PAYMENT_SEQ)?,
            order_id: original.order_id,
            method: original.method,
            status: PaymentStatus::Completed,
            amount: -req.amount,
            transaction_id: refund_transaction_id(&original.transaction_id, prior.len() + 1),
            external_id: None,
            qr_payload: None,
            expires_at: None,
            processed_by: Some(initiator.id),
            amount_tendered: None,
            change_given: None,
            refund_of: Some(original.id),
            refund_reason: Some(req.reason.trim().to_string()),
            created_at: now,
            updated_at: now,
            completed_at: Some(now),
        };
        self.storage.put_payment(&txn, &refund)?;

        let full = req.amount == refundable;
        if full {
            original.status = PaymentStatus::Refunded;
            original.updated_at = now;
            self.storage.put_payment(&txn, &original)?;
        }
        txn.commit()?;

        tracing::info!(
            refund_id = refund.id,
            payment_id,
            order_id = refund.order_id,
            amount = %req.amount,
            full,
            by = initiator.id,
            "Payment refunded"
        );
        Ok(refund)
    }

    // ========== Reconciliation ==========

    /// Compare counted cash against the cashier's recorded cash payments
    ///
    /// Advisory: writes one reconciliation record, nothing else.
    pub fn reconcile_cash_shift(
        &self,
        initiator: &CurrentUser,
        req: ReconcileCashRequest,
    ) -> PaymentResult<CashReconciliation> {
        if req.shift_start > req.shift_end {
            return Err(PaymentError::Validation(
                "shift_start must not be after shift_end".into(),
            ));
        }
        if req.actual_cash_counted.is_sign_negative() || req.expected_cash_amount.is_sign_negative() {
            return Err(PaymentError::Validation("cash amounts must not be negative".into()));
        }
        let notes = non_blank(&req.notes).map(str::to_string);
        validate_optional_text(&notes, "notes", MAX_NOTE_LEN).map_err(PaymentError::Validation)?;

        let matched: Vec<Payment> = self
            .storage
            .cash_payments_for_cashier(req.cashier_id, req.shift_start, req.shift_end)?
            .into_iter()
            .filter(|p| {
                matches!(p.status, PaymentStatus::Completed | PaymentStatus::Refunded)
                    && !p.amount.is_sign_negative()
            })
            .collect();
        let calculated: Decimal = matched.iter().map(|p| p.amount).sum();

        let txn = self.storage.begin_write()?;
        let record = CashReconciliation {
            id: self.storage.next_id(&txn, RECONCILIATION_SEQ)?,
            cashier_id: req.cashier_id,
            shift_start: req.shift_start,
            shift_end: req.shift_end,
            expected_amount: req.expected_cash_amount,
            calculated_amount: calculated,
            actual_amount: req.actual_cash_counted,
            difference: req.actual_cash_counted - calculated,
            payment_count: matched.len() as u32,
            notes,
            reconciled_by: initiator.id,
            reconciled_at: now_millis(),
        };
        self.storage.put_reconciliation(&txn, &record)?;
        txn.commit()?;

        tracing::info!(
            reconciliation_id = record.id,
            cashier_id = record.cashier_id,
            calculated = %record.calculated_amount,
            actual = %record.actual_amount,
            difference = %record.difference,
            payments = record.payment_count,
            "Cash shift reconciled"
        );
        Ok(record)
    }

    // ========== Queries ==========

    pub fn get(&self, payment_id: i64) -> PaymentResult<Payment> {
        self.storage
            .get_payment(payment_id)?
            .ok_or_else(|| PaymentError::PaymentNotFound(payment_id.to_string()))
    }

    pub fn get_by_transaction(&self, transaction_id: &str) -> PaymentResult<Payment> {
        self.storage
            .find_payment_by_txn(transaction_id)?
            .ok_or_else(|| PaymentError::PaymentNotFound(transaction_id.to_string()))
    }

    /// Every record of an order and the net collected (refunds included)
    pub fn order_payments(&self, order_id: i64) -> PaymentResult<OrderPayments> {
        if self.storage.get_order(order_id)?.is_none() {
            return Err(PaymentError::OrderNotFound(order_id));
        }
        let payments = self.storage.payments_for_order(order_id)?;
        let net_collected = payments
            .iter()
            .filter(|p| matches!(p.status, PaymentStatus::Completed | PaymentStatus::Refunded))
            .map(|p| p.amount)
            .sum();
        Ok(OrderPayments {
            order_id,
            payments,
            net_collected,
        })
    }

    pub fn list_reconciliations(&self, cashier_id: Option<i64>) -> PaymentResult<Vec<CashReconciliation>> {
        Ok(self.storage.list_reconciliations(cashier_id)?)
    }

    // ========== Internals ==========

    /// Live, pending, not yet paid
    fn load_payable_order(&self, txn: &WriteTransaction, order_id: i64) -> PaymentResult<Order> {
        let order = self
            .storage
            .get_order_txn(txn, order_id)?
            .filter(|order| !order.is_deleted())
            .ok_or(PaymentError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Pending {
            return Err(PaymentError::OrderNotPending {
                order_id,
                status: order.status,
            });
        }
        let paid = self
            .storage
            .payments_for_order_txn(txn, order_id)?
            .iter()
            .any(|p| !p.is_refund() && p.status == PaymentStatus::Completed);
        if paid {
            return Err(PaymentError::AlreadyPaid(order_id));
        }
        Ok(order)
    }

    /// Cancel pending digital payments of an order; returns how many
    fn supersede_pending_digital(
        &self,
        txn: &WriteTransaction,
        order_id: i64,
        now: i64,
    ) -> PaymentResult<usize> {
        let mut count = 0;
        for mut payment in self.storage.payments_for_order_txn(txn, order_id)? {
            if payment.method == PaymentMethod::Qris && payment.status == PaymentStatus::Pending {
                payment.status = PaymentStatus::Cancelled;
                payment.updated_at = now;
                self.storage.put_payment(txn, &payment)?;
                tracing::info!(payment_id = payment.id, order_id, "Pending digital payment superseded");
                count += 1;
            }
        }
        Ok(count)
    }

    fn unique_transaction_id(&self, txn: &WriteTransaction) -> PaymentResult<String> {
        loop {
            let candidate = generate_transaction_id();
            if !self.storage.transaction_exists_txn(txn, &candidate)? {
                return Ok(candidate);
            }
        }
    }
}
