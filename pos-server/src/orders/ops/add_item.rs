//! AddItem operation handler
//!
//! Appends a freshly priced line. Always permitted: the kitchen has no claim
//! on a line that does not exist yet.

use super::{ApplyOp, OpContext};
use crate::pricing::{line_subtotal, resolve_unit};
use shared::RevisionError;
use shared::order::{KitchenStatus, OrderLine};
use shared::revision::{OperationRecord, RevisionOp};

/// AddItem handler
#[derive(Debug, Clone)]
pub struct AddItemOp {
    /// Operation as submitted, echoed onto the ledger record
    pub op: RevisionOp,
    pub catalog_item_id: String,
    pub quantity: u32,
    pub addon_ids: Vec<String>,
    pub topping_ids: Vec<String>,
    pub notes: Option<String>,
}

impl ApplyOp for AddItemOp {
    fn apply(&self, ctx: &mut OpContext<'_>) -> Result<OperationRecord, RevisionError> {
        if self.quantity == 0 {
            return Err(RevisionError::InvalidOperation(
                "quantity must be at least 1".to_string(),
            ));
        }

        let unit = resolve_unit(
            ctx.catalog,
            &self.catalog_item_id,
            &self.addon_ids,
            &self.topping_ids,
        )?;
        let subtotal = line_subtotal(self.quantity, &unit);

        let line = OrderLine {
            id: uuid::Uuid::new_v4().to_string(),
            catalog_item_id: self.catalog_item_id.clone(),
            quantity: self.quantity,
            unit,
            subtotal,
            notes: self.notes.clone(),
            batch_number: ctx.batch_number,
            kitchen_status: KitchenStatus::Pending,
            payment_id: None,
        };
        let line_id = line.id.clone();
        ctx.items.push(line);

        Ok(OperationRecord {
            op: self.op.clone(),
            line_id,
            price_delta: subtotal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use shared::catalog::CatalogItem;

    fn catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog.upsert(CatalogItem {
            id: "sate".into(),
            name: "Sate Ayam".into(),
            price: 15000,
            addon_groups: vec![],
            toppings: vec![],
        });
        catalog
    }

    fn make_op(catalog_item_id: &str, quantity: u32) -> AddItemOp {
        let op = RevisionOp::AddItem {
            catalog_item_id: catalog_item_id.to_string(),
            quantity,
            addon_ids: vec![],
            topping_ids: vec![],
            notes: None,
        };
        AddItemOp {
            op: op.clone(),
            catalog_item_id: catalog_item_id.to_string(),
            quantity,
            addon_ids: vec![],
            topping_ids: vec![],
            notes: None,
        }
    }

    #[test]
    fn adds_priced_line_with_pending_status() {
        let catalog = catalog();
        let mut items = Vec::new();
        let mut ctx = OpContext { catalog: &catalog, items: &mut items, batch_number: 3 };

        let record = make_op("sate", 2).apply(&mut ctx).unwrap();

        assert_eq!(record.price_delta, 30000);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, record.line_id);
        assert_eq!(items[0].kitchen_status, KitchenStatus::Pending);
        assert_eq!(items[0].batch_number, 3);
        assert_eq!(items[0].subtotal, 30000);
    }

    #[test]
    fn unknown_catalog_item_is_fatal() {
        let catalog = catalog();
        let mut items = Vec::new();
        let mut ctx = OpContext { catalog: &catalog, items: &mut items, batch_number: 2 };

        let result = make_op("ghost", 1).apply(&mut ctx);
        assert!(matches!(result, Err(RevisionError::CatalogItemNotFound(_))));
        assert!(items.is_empty());
    }

    #[test]
    fn zero_quantity_rejected() {
        let catalog = catalog();
        let mut items = Vec::new();
        let mut ctx = OpContext { catalog: &catalog, items: &mut items, batch_number: 2 };

        let result = make_op("sate", 0).apply(&mut ctx);
        assert!(matches!(result, Err(RevisionError::InvalidOperation(_))));
    }
}
