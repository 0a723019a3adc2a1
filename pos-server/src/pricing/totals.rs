//! Totals calculator - order-level totals under preserved rates
//!
//! Tax and service-fee configuration may change business-wide while an order
//! is open; an in-flight order keeps the terms it was opened under. The
//! calculator therefore never reads rate configuration: it derives the rates
//! implied by the order's totals as they stood before the edit and reapplies
//! them to the new item list.

use super::round_minor;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use shared::order::{DiscountConfig, OrderLine, OrderTotals};

/// Tax and service rates implied by a prior set of totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaxServiceRates {
    pub tax: Decimal,
    pub service: Decimal,
}

impl TaxServiceRates {
    /// Build rates from configured percentages (order intake only)
    pub fn from_percent(tax_percent: f64, service_percent: f64) -> Self {
        Self {
            tax: Decimal::from_f64(tax_percent).unwrap_or_default() / Decimal::ONE_HUNDRED,
            service: Decimal::from_f64(service_percent).unwrap_or_default()
                / Decimal::ONE_HUNDRED,
        }
    }
}

/// Rates implied by prior totals: `tax / before_discount`, zero on an
/// empty base
pub fn implied_rates(prior: &OrderTotals) -> TaxServiceRates {
    if prior.total_before_discount == 0 {
        return TaxServiceRates::default();
    }
    let base = Decimal::from(prior.total_before_discount);
    TaxServiceRates {
        tax: Decimal::from(prior.total_tax) / base,
        service: Decimal::from(prior.total_service_fee) / base,
    }
}

/// Recompute the five order-level totals from the current line list
pub fn compute_totals(
    items: &[OrderLine],
    discount: &DiscountConfig,
    rates: &TaxServiceRates,
) -> OrderTotals {
    let before: i64 = items.iter().map(|l| l.subtotal).sum();
    let before_dec = Decimal::from(before);

    let percent_off = discount
        .percent
        .and_then(Decimal::from_f64)
        .map(|p| before_dec * p / Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO);
    let after = round_minor(before_dec - percent_off - Decimal::from(discount.fixed))
        .clamp(0, before);

    let tax = round_minor(before_dec * rates.tax);
    let service = round_minor(before_dec * rates.service);

    OrderTotals {
        total_before_discount: before,
        total_after_discount: after,
        total_tax: tax,
        total_service_fee: service,
        grand_total: after + tax + service,
    }
}
