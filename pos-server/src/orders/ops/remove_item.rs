//! RemoveItem operation handler
//!
//! Drops a line entirely. Same kitchen guard as quantity changes; once the
//! kitchen is cooking, the remedy is substitution, not removal.

use super::{ApplyOp, OpContext, find_line};
use shared::RevisionError;
use shared::revision::{OperationRecord, RevisionOp};

/// RemoveItem handler
#[derive(Debug, Clone)]
pub struct RemoveItemOp {
    pub op: RevisionOp,
    pub line_id: String,
}

impl ApplyOp for RemoveItemOp {
    fn apply(&self, ctx: &mut OpContext<'_>) -> Result<OperationRecord, RevisionError> {
        let idx = find_line(ctx.items, &self.line_id)?;

        if ctx.items[idx].kitchen_status.is_committed() {
            return Err(RevisionError::ItemAlreadyCommitted(self.line_id.clone()));
        }

        let removed = ctx.items.remove(idx);

        Ok(OperationRecord {
            op: self.op.clone(),
            line_id: self.line_id.clone(),
            price_delta: -removed.subtotal,
        })
    }
}
