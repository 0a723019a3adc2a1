//! Pricing - unit resolution, line pricing and totals recomputation
//!
//! All intermediate arithmetic uses `rust_decimal`; amounts enter and leave
//! as `i64` minor currency units, rounded half-away-from-zero. There are no
//! fractional cents anywhere in stored state.

pub mod line;
pub mod resolver;
pub mod totals;

pub use line::{line_subtotal, prorated_delta};
pub use resolver::resolve_unit;
pub use totals::{TaxServiceRates, compute_totals, implied_rates};

use rust_decimal::prelude::*;

/// Round a decimal amount to whole minor units
#[inline]
pub fn round_minor(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}
