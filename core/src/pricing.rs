// core/src/pricing.rs

//! Line-total arithmetic in fixed-point decimals.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::Discount;

/// Money is stored with two fractional digits.
pub const MONEY_SCALE: u32 = 2;

/// `unit_price * quantity * (1 - discount / 100)`, rounded to cents.
///
/// Rounding happens once, on the final total, with midpoints away from zero
/// (the behaviour of a `NUMERIC(12,2)` column).
pub fn line_total(unit_price: Decimal, discount: Discount, quantity: u32) -> Decimal {
  let subtotal = unit_price * Decimal::from(quantity);
  let payable_fraction = Decimal::ONE - discount.percent() / Decimal::ONE_HUNDRED;
  let mut total =
    (subtotal * payable_fraction).round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
  // round_dp leaves shorter scales alone; pad so 270 renders as 270.00.
  total.rescale(MONEY_SCALE);
  total
}
