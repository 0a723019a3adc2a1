//! Item-level diff between the pre- and post-edit line lists
//!
//! Lines are matched by id. A matched line counts as updated when its
//! identity, price, quantity or modifier signature changed; the signature is
//! the sorted, deduplicated `(name, price)` set, so reordering modifiers
//! never produces a phantom update.

use shared::order::OrderLine;
use shared::revision::ItemDiff;

/// Compute the diff after all operations have been applied
pub fn diff_items(before: &[OrderLine], after: &[OrderLine]) -> ItemDiff {
    let mut diff = ItemDiff::default();

    for line in after {
        match before.iter().find(|b| b.id == line.id) {
            None => diff.added.push(line.id.clone()),
            Some(prev) => {
                if line_changed(prev, line) {
                    diff.updated.push(line.id.clone());
                }
            }
        }
    }

    for line in before {
        if !after.iter().any(|a| a.id == line.id) {
            diff.removed.push(line.id.clone());
        }
    }

    diff
}

fn line_changed(before: &OrderLine, after: &OrderLine) -> bool {
    before.catalog_item_id != after.catalog_item_id
        || before.quantity != after.quantity
        || before.subtotal != after.subtotal
        || before.unit.modifier_signature() != after.unit.modifier_signature()
}
