//! Capture / settle state machine
//!
//! Pure state transitions over a (payment, adjustment) pair; the engine
//! persists the results inside a short transaction. An adjustment's status
//! always mirrors its payment's outcome, never leads it.

use shared::RevisionError;
use shared::payment::{
    AdjustmentStatus, Payment, PaymentAdjustment, PaymentDirection, PaymentStatus,
};

/// Gateway outcome reported for a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureResult {
    Approved,
    Declined,
}

/// Apply a gateway capture result to a charge adjustment and its payment
///
/// `Declined` is terminal for the pair but not fatal to the order; the
/// unpaid balance simply remains outstanding.
pub fn capture(
    adjustment: &mut PaymentAdjustment,
    payment: &mut Payment,
    method: &str,
    result: CaptureResult,
    now: i64,
) -> Result<(), RevisionError> {
    if adjustment.direction != PaymentDirection::Charge {
        return Err(RevisionError::InvalidOperation(format!(
            "adjustment {} is not a charge, cannot capture",
            adjustment.id
        )));
    }
    if adjustment.status != AdjustmentStatus::Pending {
        return Err(RevisionError::InvalidOperation(format!(
            "adjustment {} already processed",
            adjustment.id
        )));
    }

    match result {
        CaptureResult::Approved => {
            adjustment.status = AdjustmentStatus::Settlement;
            payment.status = PaymentStatus::Settlement;
            payment.method = method.to_string();
            payment.paid_at = Some(now);
        }
        CaptureResult::Declined => {
            adjustment.status = AdjustmentStatus::Failed;
            payment.status = PaymentStatus::Failed;
        }
    }
    adjustment.processed_at = Some(now);
    Ok(())
}

/// Confirm collection of a pending payment
pub fn settle(payment: &mut Payment, now: i64) -> Result<(), RevisionError> {
    if payment.status != PaymentStatus::Pending {
        return Err(RevisionError::InvalidOperation(format!(
            "payment {} is not pending, cannot settle",
            payment.id
        )));
    }
    payment.status = PaymentStatus::Settlement;
    payment.paid_at = Some(now);
    Ok(())
}

/// Mirror a settled payment onto one of its pending adjustments
pub fn mirror_adjustment(adjustment: &mut PaymentAdjustment, now: i64) {
    if adjustment.status == AdjustmentStatus::Pending {
        adjustment.status = AdjustmentStatus::Settlement;
        adjustment.processed_at = Some(now);
    }
}
