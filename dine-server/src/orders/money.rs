//! Money calculation using rust_decimal
//!
//! Prices arrive from the catalog as 2dp decimals. Line totals are exact
//! products; tax is rounded once on the subtotal, half away from zero.

use rust_decimal::prelude::*;

/// 2 decimal places, half-up
pub const DECIMAL_PLACES: u32 = 2;

/// VAT applied to every order subtotal (10%)
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Round a currency value to 2dp, midpoint away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `None` when the product does not fit in a decimal
pub fn line_total(unit_price: Decimal, quantity: i32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity)).map(round_money)
}

/// Order amounts derived from its lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// `subtotal = Σ line_total`, `tax = round(subtotal × 10%)`, `total = subtotal + tax`
///
/// `None` on decimal overflow.
pub fn order_totals(line_totals: impl IntoIterator<Item = Decimal>) -> Option<OrderTotals> {
    let sum = line_totals
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line))?;
    let subtotal = round_money(sum);
    let tax = round_money(subtotal.checked_mul(TAX_RATE)?);
    Some(OrderTotals {
        subtotal,
        tax,
        total: subtotal.checked_add(tax)?,
    })
}
