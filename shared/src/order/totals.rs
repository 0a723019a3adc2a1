//! Order-level monetary totals

use serde::{Deserialize, Serialize};

/// Order totals in minor currency units
///
/// Always a pure function of the item list, the order's discount fields and
/// the tax/service rates implied by the totals as they stood before the edit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OrderTotals {
    pub total_before_discount: i64,
    pub total_after_discount: i64,
    pub total_tax: i64,
    pub total_service_fee: i64,
    pub grand_total: i64,
}

impl OrderTotals {
    /// Check the structural invariant: grand total is the sum of its parts
    /// and discounts never increase the total.
    pub fn is_consistent(&self) -> bool {
        self.grand_total == self.total_after_discount + self.total_tax + self.total_service_fee
            && self.total_after_discount <= self.total_before_discount
    }
}

/// Discount configuration carried by the order
///
/// Owned by the order and never changed by the revision engine; it only
/// feeds the totals recomputation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct DiscountConfig {
    /// Percentage discount in [0, 100]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// Fixed discount in minor units
    #[serde(default)]
    pub fixed: i64,
}
