//! Revision types - requests, operations and the append-only ledger entry
//!
//! A revision is one atomic, audited edit to an order's item list and totals.
//! The ledger entry is created exactly once per accepted edit, inside the same
//! transaction as the order update, and never mutated afterward.

use crate::order::Order;
use crate::payment::AllocationEffects;
use serde::{Deserialize, Serialize};

/// Who performed or authorized an edit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

/// Why an edit happened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RevisionReason {
    /// Short machine-readable code, e.g. "OUT_OF_STOCK", "CUSTOMER_REQUEST"
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One item operation inside a revision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionOp {
    /// Append a new line; always permitted
    AddItem {
        catalog_item_id: String,
        quantity: u32,
        #[serde(default)]
        addon_ids: Vec<String>,
        #[serde(default)]
        topping_ids: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    /// Change a line's quantity; rejected once the kitchen committed
    UpdateQuantity {
        line_id: String,
        from_qty: u32,
        to_qty: u32,
    },
    /// Remove a line; rejected once the kitchen committed
    RemoveItem { line_id: String },
    /// Replace a line's identity/modifiers, keeping its quantity.
    /// Permitted regardless of kitchen status (the out-of-stock remedy).
    SubstituteItem {
        line_id: String,
        new_catalog_item_id: String,
        #[serde(default)]
        addon_ids: Vec<String>,
        #[serde(default)]
        topping_ids: Vec<String>,
    },
}

impl RevisionOp {
    /// Line id the operation targets, when it targets an existing line
    pub fn target_line_id(&self) -> Option<&str> {
        match self {
            RevisionOp::AddItem { .. } => None,
            RevisionOp::UpdateQuantity { line_id, .. }
            | RevisionOp::RemoveItem { line_id }
            | RevisionOp::SubstituteItem { line_id, .. } => Some(line_id),
        }
    }
}

/// Operation as recorded on the ledger, annotated with its realized outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationRecord {
    pub op: RevisionOp,
    /// Line the operation ended up acting on (the new line id for adds)
    pub line_id: String,
    /// Realized line-subtotal delta in minor units, signed
    pub price_delta: i64,
}

/// Item-level difference between the pre- and post-edit line lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ItemDiff {
    /// Line ids present after but not before
    #[serde(default)]
    pub added: Vec<String>,
    /// Line ids present before but not after
    #[serde(default)]
    pub removed: Vec<String>,
    /// Line ids present in both whose price, quantity or modifier
    /// signature changed
    #[serde(default)]
    pub updated: Vec<String>,
}

impl ItemDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Immutable ledger entry - one per accepted edit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Revision {
    pub id: String,
    pub order_id: String,
    pub version_from: u64,
    /// Always `version_from + 1`
    pub version_to: u64,
    pub reason: RevisionReason,
    pub created_by: Actor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Actor>,
    /// Signed grand-total delta in minor units
    pub delta_amount: i64,
    pub operations: Vec<OperationRecord>,
    pub diff: ItemDiff,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: i64,
    /// Hash of the previous ledger entry for this order ("0" * 64 for the first)
    pub prev_hash: String,
    /// Hash over this entry's canonical fields plus `prev_hash`
    pub curr_hash: String,
}

/// Revision submission - the single mutation entry point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionRequest {
    pub order_id: String,
    pub operations: Vec<RevisionOp>,
    pub reason: RevisionReason,
    pub actor: Actor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Actor>,
    /// Matching a previously committed revision short-circuits to it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Order version the caller composed this revision against.
    /// Defaults to the engine's own fresh read when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_version: Option<u64>,
}

/// Result of an accepted revision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionOutcome {
    pub revision: Revision,
    /// Order snapshot after the edit
    pub order: Order,
    pub effects: AllocationEffects,
    /// True when the request was answered from the idempotency table
    #[serde(default)]
    pub replayed: bool,
}
