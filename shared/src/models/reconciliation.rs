//! Cash Reconciliation Model
//!
//! End-of-shift comparison between counted cash and the cash payments the
//! system recorded for a cashier. Advisory only: creating one never touches
//! payments or orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashReconciliation {
    pub id: i64,
    pub cashier_id: i64,
    /// Unix millis, inclusive
    pub shift_start: i64,
    /// Unix millis, inclusive
    pub shift_end: i64,
    /// What the cashier expected to have
    pub expected_amount: Decimal,
    /// Sum of matched cash payments
    pub calculated_amount: Decimal,
    /// What was actually counted
    pub actual_amount: Decimal,
    /// `actual_amount - calculated_amount`
    pub difference: Decimal,
    pub payment_count: u32,
    pub notes: Option<String>,
    pub reconciled_by: i64,
    pub reconciled_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileCashRequest {
    pub cashier_id: i64,
    pub actual_cash_counted: Decimal,
    pub expected_cash_amount: Decimal,
    pub shift_start: i64,
    pub shift_end: i64,
    #[serde(default)]
    pub notes: Option<String>,
}
