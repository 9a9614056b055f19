//! Payment Model
//!
//! A refund never rewrites the original payment's amount. It is recorded as a
//! separate negative-amount payment linked to the same order, so the net
//! collected for an order is the sum of all its payment amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::order::Order;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Scan-to-pay digital payment, settled by provider callback
    Qris,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qris => "qris",
            Self::Cash => "cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    /// Superseded by a newer digital payment for the same order
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Negative for refund records
    pub amount: Decimal,
    pub transaction_id: String,
    /// Provider-side reference, set on verification
    pub external_id: Option<String>,
    /// Digital only
    pub qr_payload: Option<String>,
    /// Digital only, Unix millis
    pub expires_at: Option<i64>,
    /// Cashier (cash payments) or staff member (refunds) who recorded it
    pub processed_by: Option<i64>,
    /// Cash only, kept as side-facts next to the amount
    pub amount_tendered: Option<Decimal>,
    pub change_given: Option<Decimal>,
    /// Set on refund records: the payment being refunded
    pub refund_of: Option<i64>,
    pub refund_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
}

impl Payment {
    pub fn is_refund(&self) -> bool {
        self.refund_of.is_some()
    }
}

// ========== Requests / Responses ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateQrisRequest {
    pub order_id: i64,
}

/// Digital payment handed back to the customer's device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrisPayment {
    pub payment_id: i64,
    pub order_id: i64,
    pub transaction_id: String,
    pub qr_payload: String,
    pub amount: Decimal,
    pub expires_at: i64,
}

/// Provider callback / manual verification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub transaction_id: String,
    #[serde(default)]
    pub external_id: Option<String>,
    pub amount: Decimal,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub payment: Payment,
    /// The advanced order, when this verification confirmed it
    pub order: Option<Order>,
    pub order_advanced: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashPaymentRequest {
    pub order_id: i64,
    pub amount_tendered: Decimal,
    /// Optional cross-check against the computed change
    #[serde(default)]
    pub change_given: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashPaymentReceipt {
    pub payment: Payment,
    pub order: Order,
    pub change_given: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub amount: Decimal,
    pub reason: String,
}

/// All payment records of one order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayments {
    pub order_id: i64,
    pub payments: Vec<Payment>,
    /// Sum of every amount, refunds included
    pub net_collected: Decimal,
}
