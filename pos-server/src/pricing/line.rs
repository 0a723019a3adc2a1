//! Line pricer - pure subtotal arithmetic

use super::round_minor;
use rust_decimal::Decimal;
use shared::order::UnitComponents;

/// Line subtotal: quantity x (base + addons + toppings), in minor units
pub fn line_subtotal(quantity: u32, unit: &UnitComponents) -> i64 {
    let qty = Decimal::from(quantity);
    let unit_total = Decimal::from(unit.unit_total());
    round_minor(qty * unit_total)
}

/// Proportional delta for a quantity change, from the stored subtotal
///
/// `(to_qty - from_qty) x (old_subtotal / from_qty)`. The unit price comes
/// from the stored subtotal, not a catalog re-resolution, so the rounding
/// baked in at original pricing time is preserved.
pub fn prorated_delta(old_subtotal: i64, from_qty: u32, to_qty: u32) -> i64 {
    if from_qty == 0 {
        return 0;
    }
    let unit = Decimal::from(old_subtotal) / Decimal::from(from_qty);
    let qty_delta = Decimal::from(to_qty as i64 - from_qty as i64);
    round_minor(unit * qty_delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::PricedModifier;

    #[test]
    fn subtotal_multiplies_unit_total() {
        let unit = UnitComponents {
            base_price: 15000,
            addons: vec![PricedModifier { name: "Jumbo".into(), price: 5000 }],
            toppings: vec![PricedModifier { name: "Egg".into(), price: 3000 }],
        };
        assert_eq!(line_subtotal(2, &unit), 46000);
    }

    #[test]
    fn prorated_delta_scales_with_quantity() {
        // qty 2 @ 20000 total -> one more unit adds 10000
        assert_eq!(prorated_delta(20000, 2, 3), 10000);
        // dropping to 1 removes 10000
        assert_eq!(prorated_delta(20000, 2, 1), -10000);
    }

    #[test]
    fn prorated_delta_keeps_original_rounding() {
        // 10001 over 3 units: unit price 3333.67, going to 4 adds 3334
        assert_eq!(prorated_delta(10001, 3, 4), 3334);
        // removing all but one drops two thirds
        assert_eq!(prorated_delta(10001, 3, 1), -6667);
    }

    #[test]
    fn zero_from_qty_is_inert() {
        assert_eq!(prorated_delta(5000, 0, 3), 0);
    }
}
