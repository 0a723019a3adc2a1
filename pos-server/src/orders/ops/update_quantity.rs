//! UpdateQuantity operation handler
//!
//! Rescales a line's subtotal proportionally from its stored unit price.
//! Rejected once the kitchen has committed to the line.

use super::{ApplyOp, OpContext, find_line};
use crate::pricing::prorated_delta;
use shared::RevisionError;
use shared::revision::{OperationRecord, RevisionOp};

/// UpdateQuantity handler
#[derive(Debug, Clone)]
pub struct UpdateQuantityOp {
    pub op: RevisionOp,
    pub line_id: String,
    pub from_qty: u32,
    pub to_qty: u32,
}

impl ApplyOp for UpdateQuantityOp {
    fn apply(&self, ctx: &mut OpContext<'_>) -> Result<OperationRecord, RevisionError> {
        let idx = find_line(ctx.items, &self.line_id)?;
        let line = &mut ctx.items[idx];

        if line.kitchen_status.is_committed() {
            return Err(RevisionError::ItemAlreadyCommitted(self.line_id.clone()));
        }
        if self.to_qty == 0 {
            return Err(RevisionError::InvalidOperation(
                "to_qty must be at least 1, use REMOVE_ITEM instead".to_string(),
            ));
        }
        if self.from_qty != line.quantity {
            return Err(RevisionError::InvalidOperation(format!(
                "from_qty {} does not match current quantity {}",
                self.from_qty, line.quantity
            )));
        }
        if self.to_qty == self.from_qty {
            return Err(RevisionError::InvalidOperation(
                "quantity is unchanged".to_string(),
            ));
        }

        let delta = prorated_delta(line.subtotal, self.from_qty, self.to_qty);
        line.quantity = self.to_qty;
        line.subtotal += delta;

        Ok(OperationRecord {
            op: self.op.clone(),
            line_id: self.line_id.clone(),
            price_delta: delta,
        })
    }
}
