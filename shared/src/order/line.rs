//! Order line - one priced item entry on an order

use serde::{Deserialize, Serialize};

/// Kitchen lifecycle of a line
///
/// Lines at `Cooking` or later are committed: the kitchen has started work
/// and quantity changes / removals are no longer allowed (substitution is).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenStatus {
    #[default]
    Pending,
    Printed,
    Cooking,
    Ready,
    Served,
}

impl KitchenStatus {
    /// Whether the kitchen has committed to this line
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            KitchenStatus::Cooking | KitchenStatus::Ready | KitchenStatus::Served
        )
    }
}

/// One resolved modifier (addon option or topping) with its price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedModifier {
    pub name: String,
    /// Price in minor currency units
    pub price: i64,
}

/// Per-unit price components of a line
///
/// The line subtotal is always recomputed from these plus the quantity,
/// never hand-edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UnitComponents {
    /// Base catalog price in minor units
    pub base_price: i64,
    #[serde(default)]
    pub addons: Vec<PricedModifier>,
    #[serde(default)]
    pub toppings: Vec<PricedModifier>,
}

impl UnitComponents {
    /// Sum of base price and all modifier prices, in minor units
    pub fn unit_total(&self) -> i64 {
        self.base_price
            + self.addons.iter().map(|a| a.price).sum::<i64>()
            + self.toppings.iter().map(|t| t.price).sum::<i64>()
    }

    /// Sorted, deduplicated `(name, price)` pairs across addons and toppings
    ///
    /// Stable under reordering of modifiers; used by the revision diff to
    /// decide whether a line's modifiers actually changed.
    pub fn modifier_signature(&self) -> Vec<(String, i64)> {
        let mut sig: Vec<(String, i64)> = self
            .addons
            .iter()
            .chain(self.toppings.iter())
            .map(|m| (m.name.clone(), m.price))
            .collect();
        sig.sort();
        sig.dedup();
        sig
    }
}

/// One item on an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    /// Stable line id, assigned once when the line is created
    pub id: String,
    pub catalog_item_id: String,
    /// Quantity, always >= 1
    pub quantity: u32,
    pub unit: UnitComponents,
    /// Line subtotal in minor units (quantity x unit components, rounded)
    pub subtotal: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Kitchen ticket batch this line was added in
    pub batch_number: u32,
    pub kitchen_status: KitchenStatus,
    /// Pending payment this line was added under, when its revision created
    /// a brand-new pending payment. Existing lines are never re-tagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

impl OrderLine {
    /// Per-unit price implied by the stored subtotal and quantity
    ///
    /// Uses the stored subtotal rather than re-resolving catalog prices, so
    /// whatever rounding happened at original pricing time is preserved.
    pub fn implied_unit_price(&self) -> f64 {
        if self.quantity == 0 {
            return 0.0;
        }
        self.subtotal as f64 / self.quantity as f64
    }
}
