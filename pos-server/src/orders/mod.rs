//! Order revision module
//!
//! - **engine**: the single mutation entry point (submit / capture / settle)
//! - **ops**: one handler per operation kind, applied against a working copy
//! - **diff**: item-level difference between pre- and post-edit lists
//! - **ledger**: hash-chained append-only audit trail

pub mod diff;
pub mod engine;
pub mod ledger;
pub mod ops;

pub use engine::{LineInput, OpenOrderRequest, RecordPaymentRequest, RevisionEngine};
