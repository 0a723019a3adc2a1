//! SubstituteItem operation handler
//!
//! Replaces a line's identity and modifiers while preserving its quantity
//! and line id. Permitted regardless of kitchen status: this is the
//! prescribed remedy for out-of-stock after cooking has started, replacing
//! rather than canceling an already-committed item. The replacement dish
//! still has to be prepared, so the kitchen status resets to pending.

use super::{ApplyOp, OpContext, find_line};
use crate::pricing::{line_subtotal, resolve_unit};
use shared::RevisionError;
use shared::order::KitchenStatus;
use shared::revision::{OperationRecord, RevisionOp};

/// SubstituteItem handler
#[derive(Debug, Clone)]
pub struct SubstituteItemOp {
    pub op: RevisionOp,
    pub line_id: String,
    pub new_catalog_item_id: String,
    pub addon_ids: Vec<String>,
    pub topping_ids: Vec<String>,
}

impl ApplyOp for SubstituteItemOp {
    fn apply(&self, ctx: &mut OpContext<'_>) -> Result<OperationRecord, RevisionError> {
        let idx = find_line(ctx.items, &self.line_id)?;

        let unit = resolve_unit(
            ctx.catalog,
            &self.new_catalog_item_id,
            &self.addon_ids,
            &self.topping_ids,
        )?;

        let line = &mut ctx.items[idx];
        let old_subtotal = line.subtotal;
        let new_subtotal = line_subtotal(line.quantity, &unit);

        line.catalog_item_id = self.new_catalog_item_id.clone();
        line.unit = unit;
        line.subtotal = new_subtotal;
        line.kitchen_status = KitchenStatus::Pending;

        Ok(OperationRecord {
            op: self.op.clone(),
            line_id: self.line_id.clone(),
            price_delta: new_subtotal - old_subtotal,
        })
    }
}
