//! Error taxonomy for the revision core
//!
//! Every fatal condition aborts the enclosing transaction before any write is
//! visible; the caller receives a structured error identifying the kind and,
//! where relevant, the offending id. Nothing here is retried automatically.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Revision errors surfaced to callers
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RevisionError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Item not found on order: {0}")]
    ItemNotFound(String),

    /// The kitchen has already committed to the line; resubmit as a
    /// substitution or drop the operation.
    #[error("Item already committed to kitchen: {0}")]
    ItemAlreadyCommitted(String),

    #[error("Catalog item not found: {0}")]
    CatalogItemNotFound(String),

    /// Optimistic lock lost the race; re-read and retry from a fresh snapshot
    #[error("Order version mismatch: expected {expected}, found {actual}")]
    OrderVersionMismatch { expected: u64, actual: u64 },

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Adjustment not found: {0}")]
    AdjustmentNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable wire codes for the error taxonomy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionErrorCode {
    OrderNotFound,
    ItemNotFound,
    ItemAlreadyCommitted,
    CatalogItemNotFound,
    OrderVersionMismatch,
    PaymentNotFound,
    AdjustmentNotFound,
    InvalidOperation,
    StorageError,
    InternalError,
}

impl RevisionError {
    pub fn code(&self) -> RevisionErrorCode {
        match self {
            RevisionError::OrderNotFound(_) => RevisionErrorCode::OrderNotFound,
            RevisionError::ItemNotFound(_) => RevisionErrorCode::ItemNotFound,
            RevisionError::ItemAlreadyCommitted(_) => RevisionErrorCode::ItemAlreadyCommitted,
            RevisionError::CatalogItemNotFound(_) => RevisionErrorCode::CatalogItemNotFound,
            RevisionError::OrderVersionMismatch { .. } => RevisionErrorCode::OrderVersionMismatch,
            RevisionError::PaymentNotFound(_) => RevisionErrorCode::PaymentNotFound,
            RevisionError::AdjustmentNotFound(_) => RevisionErrorCode::AdjustmentNotFound,
            RevisionError::InvalidOperation(_) => RevisionErrorCode::InvalidOperation,
            RevisionError::Storage(_) => RevisionErrorCode::StorageError,
            RevisionError::Internal(_) => RevisionErrorCode::InternalError,
        }
    }
}
