//! Shared types for the POS order-revision backend
//!
//! Common types used across the server and its clients: the order aggregate,
//! revision operations and ledger entries, payment records, catalog lookup
//! types and the error taxonomy.

pub mod catalog;
pub mod error;
pub mod notice;
pub mod order;
pub mod payment;
pub mod revision;

// Re-exports
pub use error::{RevisionError, RevisionErrorCode};
pub use notice::ChangeNotice;
pub use order::{
    DiscountConfig, KitchenStatus, Order, OrderLine, OrderTotals, PricedModifier, UnitComponents,
};
pub use payment::{
    AdjustmentKind, AdjustmentStatus, AllocationEffects, Payment, PaymentAdjustment,
    PaymentDirection, PaymentKind, PaymentStatus, PendingAdjusted,
};
pub use revision::{
    Actor, ItemDiff, OperationRecord, Revision, RevisionOp, RevisionOutcome, RevisionReason,
    RevisionRequest,
};

/// Current time in Unix milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
