//! Revision operation handlers
//!
//! Each handler implements the `ApplyOp` trait and handles one operation
//! kind. Handlers mutate the working copy of the item list and return the
//! annotated `OperationRecord`; they never touch storage. Any error rejects
//! the whole revision - operations are all-or-nothing.

use crate::catalog::CatalogStore;
use shared::RevisionError;
use shared::order::OrderLine;
use shared::revision::{OperationRecord, RevisionOp};

mod add_item;
mod remove_item;
mod substitute_item;
mod update_quantity;

pub use add_item::AddItemOp;
pub use remove_item::RemoveItemOp;
pub use substitute_item::SubstituteItemOp;
pub use update_quantity::UpdateQuantityOp;

/// Working state shared by the handlers of one revision
pub struct OpContext<'a> {
    pub catalog: &'a dyn CatalogStore,
    /// Working copy of the order's item list
    pub items: &'a mut Vec<OrderLine>,
    /// Batch number assigned to lines added by this revision
    pub batch_number: u32,
}

/// One revision operation applied against the working item list
pub trait ApplyOp {
    fn apply(&self, ctx: &mut OpContext<'_>) -> Result<OperationRecord, RevisionError>;
}

/// OpAction enum - dispatches to concrete handler implementations
pub enum OpAction {
    AddItem(AddItemOp),
    UpdateQuantity(UpdateQuantityOp),
    RemoveItem(RemoveItemOp),
    SubstituteItem(SubstituteItemOp),
}

impl ApplyOp for OpAction {
    fn apply(&self, ctx: &mut OpContext<'_>) -> Result<OperationRecord, RevisionError> {
        match self {
            OpAction::AddItem(op) => op.apply(ctx),
            OpAction::UpdateQuantity(op) => op.apply(ctx),
            OpAction::RemoveItem(op) => op.apply(ctx),
            OpAction::SubstituteItem(op) => op.apply(ctx),
        }
    }
}

/// Convert a submitted operation to its handler
///
/// This is the only place that matches on `RevisionOp` variants.
impl From<&RevisionOp> for OpAction {
    fn from(op: &RevisionOp) -> Self {
        match op {
            RevisionOp::AddItem {
                catalog_item_id,
                quantity,
                addon_ids,
                topping_ids,
                notes,
            } => OpAction::AddItem(AddItemOp {
                op: op.clone(),
                catalog_item_id: catalog_item_id.clone(),
                quantity: *quantity,
                addon_ids: addon_ids.clone(),
                topping_ids: topping_ids.clone(),
                notes: notes.clone(),
            }),
            RevisionOp::UpdateQuantity {
                line_id,
                from_qty,
                to_qty,
            } => OpAction::UpdateQuantity(UpdateQuantityOp {
                op: op.clone(),
                line_id: line_id.clone(),
                from_qty: *from_qty,
                to_qty: *to_qty,
            }),
            RevisionOp::RemoveItem { line_id } => OpAction::RemoveItem(RemoveItemOp {
                op: op.clone(),
                line_id: line_id.clone(),
            }),
            RevisionOp::SubstituteItem {
                line_id,
                new_catalog_item_id,
                addon_ids,
                topping_ids,
            } => OpAction::SubstituteItem(SubstituteItemOp {
                op: op.clone(),
                line_id: line_id.clone(),
                new_catalog_item_id: new_catalog_item_id.clone(),
                addon_ids: addon_ids.clone(),
                topping_ids: topping_ids.clone(),
            }),
        }
    }
}

/// Find a line index or fail with `ItemNotFound`
pub(crate) fn find_line(items: &[OrderLine], line_id: &str) -> Result<usize, RevisionError> {
    items
        .iter()
        .position(|l| l.id == line_id)
        .ok_or_else(|| RevisionError::ItemNotFound(line_id.to_string()))
}
