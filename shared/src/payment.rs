//! Payment and payment-adjustment records
//!
//! Payments are owned by the allocator: pending payments may have their
//! amount adjusted in place, settled payments are only touched by their own
//! settle/capture operation. Adjustments are the audit trail of allocation
//! decisions.

use serde::{Deserialize, Serialize};

/// Payment settlement state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    /// Money has actually moved (collected or refunded)
    Settlement,
    Failed,
}

/// Role of a payment within the order's collection plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    #[default]
    Full,
    DownPayment,
    FinalPayment,
}

/// Direction of money movement for an adjustment-born payment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentDirection {
    Charge,
    Refund,
}

/// A charge or refund record against an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub method: String,
    pub status: PaymentStatus,
    /// Amount in minor units, always >= 0
    pub amount: i64,
    pub kind: PaymentKind,
    /// True when this record was produced by a revision's allocation
    #[serde(default)]
    pub is_adjustment: bool,
    /// Present only when `is_adjustment`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<PaymentDirection>,
    /// Back-reference, e.g. a final payment referencing its down payment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_payment_id: Option<String>,
    /// Revision that produced this record, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
    /// External gateway reference recorded at capture time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
}

impl Payment {
    pub fn is_settled(&self) -> bool {
        self.status == PaymentStatus::Settlement
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }
}

/// What an allocation decision did
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentKind {
    /// Raised the amount of an existing pending payment
    IncreasePending,
    /// Lowered the amount of an existing pending payment
    DecreasePending,
    /// Created an immediately-settled cash-out
    Refund,
}

impl AdjustmentKind {
    /// Money direction implied by the kind
    pub fn direction(&self) -> PaymentDirection {
        match self {
            AdjustmentKind::IncreasePending => PaymentDirection::Charge,
            AdjustmentKind::DecreasePending | AdjustmentKind::Refund => PaymentDirection::Refund,
        }
    }
}

/// Adjustment lifecycle, always mirroring its payment's outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentStatus {
    #[default]
    Pending,
    Settlement,
    Failed,
}

/// Audit record of one allocation decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentAdjustment {
    pub id: String,
    pub order_id: String,
    pub revision_id: String,
    /// Payment this adjustment acted on or created
    pub payment_id: String,
    pub kind: AdjustmentKind,
    pub direction: PaymentDirection,
    /// Magnitude in minor units, always >= 0
    pub amount: i64,
    pub status: AdjustmentStatus,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<i64>,
}

/// In-place amount change applied to a pending payment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingAdjusted {
    pub payment_id: String,
    /// Signed change in minor units
    pub amount_delta: i64,
}

/// Payment-side effects of one revision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AllocationEffects {
    #[serde(default)]
    pub pending_adjusted: Vec<PendingAdjusted>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_pending_payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_payment_id: Option<String>,
    /// Ids of the adjustment audit records written for this revision
    #[serde(default)]
    pub adjustment_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjustment_kind_direction() {
        assert_eq!(AdjustmentKind::IncreasePending.direction(), PaymentDirection::Charge);
        assert_eq!(AdjustmentKind::DecreasePending.direction(), PaymentDirection::Refund);
        assert_eq!(AdjustmentKind::Refund.direction(), PaymentDirection::Refund);
    }
}
