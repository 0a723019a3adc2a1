//! POS order-revision backend
//!
//! The core of this server is order mutation after creation: a live order,
//! possibly already partially or fully paid, is edited through atomic,
//! audited revisions. Each revision validates every operation against the
//! kitchen state, reprices the item list, recomputes totals under the
//! order's original tax/service terms, and reconciles the resulting price
//! delta against the order's existing payments.
//!
//! # Module map
//!
//! - **catalog**: read-only menu price lookup (external collaborator seam)
//! - **pricing**: unit resolution, line pricing, totals recomputation
//! - **orders**: the revision engine and its per-operation handlers
//! - **payments**: delta allocation and the capture/settle state machine
//! - **storage**: redb persistence with one transaction per revision
//! - **api**: thin axum layer over the engine

pub mod api;
pub mod catalog;
pub mod common;
pub mod core;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod storage;

pub use crate::core::config::Config;
pub use crate::core::state::AppState;
pub use orders::engine::RevisionEngine;
