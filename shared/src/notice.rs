//! Change notifications emitted on successful commit
//!
//! Delivery (socket, queue) is external; the core only broadcasts.

use crate::payment::{AdjustmentStatus, AllocationEffects, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Notice broadcast after a commit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeNotice {
    /// An order was revised
    OrderChanged {
        order_id: String,
        new_version: u64,
        /// Signed grand-total delta in minor units
        delta_amount: i64,
        effects: AllocationEffects,
    },
    /// A payment or adjustment changed state (capture/settle)
    PaymentChanged {
        order_id: String,
        payment_id: String,
        status: PaymentStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        adjustment_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        adjustment_status: Option<AdjustmentStatus>,
    },
}

impl ChangeNotice {
    /// Order the notice concerns
    pub fn order_id(&self) -> &str {
        match self {
            ChangeNotice::OrderChanged { order_id, .. }
            | ChangeNotice::PaymentChanged { order_id, .. } => order_id,
        }
    }
}
