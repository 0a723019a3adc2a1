//! Payment allocator - realizes a revision's delta against existing payments
//!
//! The allocator never lets a negative delta vanish once money has actually
//! been collected: it must surface either as a reduction of something not yet
//! collected (no cash movement) or as an explicit, immediately-settled
//! refund. A positive delta before any settlement is a paper adjustment;
//! after settlement it must produce a new collectible amount, because the
//! business already closed out the original collection.
//!
//! Pure planning: the function only builds records; the engine persists them
//! inside the revision's transaction.

use shared::payment::{
    AdjustmentKind, AdjustmentStatus, AllocationEffects, Payment, PaymentAdjustment,
    PaymentDirection, PaymentKind, PaymentStatus, PendingAdjusted,
};

/// Everything one allocation decided to write
#[derive(Debug, Clone, Default)]
pub struct AllocationPlan {
    pub effects: AllocationEffects,
    /// Pending payments with their amounts already adjusted
    pub updated_payments: Vec<Payment>,
    /// Newly created payments (a pending charge or a settled refund)
    pub new_payments: Vec<Payment>,
    pub adjustments: Vec<PaymentAdjustment>,
}

impl AllocationPlan {
    /// Signed sum of every payment-side movement, for conservation checks
    pub fn signed_total(&self) -> i64 {
        let adjusted: i64 = self
            .effects
            .pending_adjusted
            .iter()
            .map(|p| p.amount_delta)
            .sum();
        let created: i64 = self
            .new_payments
            .iter()
            .map(|p| match p.direction {
                Some(PaymentDirection::Refund) => -p.amount,
                _ => p.amount,
            })
            .sum();
        adjusted + created
    }
}

/// Decide how a grand-total delta becomes payment-side effects
pub fn allocate(
    order_id: &str,
    revision_id: &str,
    grand_delta: i64,
    payments: &[Payment],
    now: i64,
) -> AllocationPlan {
    let mut plan = AllocationPlan::default();
    if grand_delta == 0 {
        return plan;
    }

    // "Settlement" means the order's collection has been closed out: a
    // settled Full or Final payment. A settled down payment alone leaves the
    // order in the pre-settlement regime, and a refund is itself a settled
    // record without counting as collection.
    let settled: Vec<&Payment> = payments
        .iter()
        .filter(|p| {
            p.is_settled()
                && p.direction != Some(PaymentDirection::Refund)
                && p.kind != PaymentKind::DownPayment
        })
        .collect();
    let settled_down_payment = payments.iter().find(|p| {
        p.is_settled()
            && p.kind == PaymentKind::DownPayment
            && p.direction != Some(PaymentDirection::Refund)
    });
    let pending = payments.iter().find(|p| p.is_pending());

    if settled.is_empty() {
        // Nothing collected yet: every move is a paper adjustment.
        match pending {
            Some(pending) => {
                // Clamp at zero; a shortfall below an empty pending charge
                // has nothing to undo.
                let applied = if grand_delta >= 0 {
                    grand_delta
                } else {
                    -grand_delta.abs().min(pending.amount)
                };
                if applied != 0 {
                    adjust_pending(&mut plan, pending, applied, order_id, revision_id, now);
                }
            }
            None if grand_delta > 0 => {
                let kind = if settled_down_payment.is_some() {
                    PaymentKind::FinalPayment
                } else {
                    PaymentKind::Full
                };
                let related = settled_down_payment.map(|p| p.id.clone());
                create_pending(
                    &mut plan,
                    order_id,
                    revision_id,
                    grand_delta,
                    kind,
                    related,
                    now,
                );
            }
            // Negative delta with nothing collected and nothing pending:
            // absorbed with no payment-side artifact. The ledger entry is
            // the audit record.
            None => {}
        }
        return plan;
    }

    // Settlement exists.
    if grand_delta > 0 {
        match pending {
            Some(pending) => {
                adjust_pending(&mut plan, pending, grand_delta, order_id, revision_id, now);
            }
            None => {
                let related = settled_down_payment.map(|p| p.id.clone());
                create_pending(
                    &mut plan,
                    order_id,
                    revision_id,
                    grand_delta,
                    PaymentKind::FinalPayment,
                    related,
                    now,
                );
            }
        }
        return plan;
    }

    // Settlement exists, negative delta: offset the pending charge first,
    // refund whatever it cannot absorb.
    let mut remaining = grand_delta.abs();
    if let Some(pending) = pending
        && pending.amount > 0
    {
        let offset = remaining.min(pending.amount);
        adjust_pending(&mut plan, pending, -offset, order_id, revision_id, now);
        remaining -= offset;
    }

    if remaining > 0 {
        // Refund against the original settled collection, instantly settled.
        let original = settled[0];
        let refund_id = uuid::Uuid::new_v4().to_string();
        plan.new_payments.push(Payment {
            id: refund_id.clone(),
            order_id: order_id.to_string(),
            method: original.method.clone(),
            status: PaymentStatus::Settlement,
            amount: remaining,
            kind: PaymentKind::Full,
            is_adjustment: true,
            direction: Some(PaymentDirection::Refund),
            related_payment_id: Some(original.id.clone()),
            revision_id: Some(revision_id.to_string()),
            transaction_ref: None,
            created_at: now,
            paid_at: Some(now),
        });
        let adjustment_id = uuid::Uuid::new_v4().to_string();
        plan.adjustments.push(PaymentAdjustment {
            id: adjustment_id.clone(),
            order_id: order_id.to_string(),
            revision_id: revision_id.to_string(),
            payment_id: refund_id.clone(),
            kind: AdjustmentKind::Refund,
            direction: PaymentDirection::Refund,
            amount: remaining,
            status: AdjustmentStatus::Settlement,
            created_at: now,
            processed_at: Some(now),
        });
        plan.effects.refund_payment_id = Some(refund_id);
        plan.effects.adjustment_ids.push(adjustment_id);
    }

    plan
}

/// Change a pending payment's amount in place and record the adjustment
fn adjust_pending(
    plan: &mut AllocationPlan,
    pending: &Payment,
    applied: i64,
    order_id: &str,
    revision_id: &str,
    now: i64,
) {
    let mut updated = pending.clone();
    updated.amount += applied;

    let kind = if applied > 0 {
        AdjustmentKind::IncreasePending
    } else {
        AdjustmentKind::DecreasePending
    };
    let adjustment_id = uuid::Uuid::new_v4().to_string();
    plan.adjustments.push(PaymentAdjustment {
        id: adjustment_id.clone(),
        order_id: order_id.to_string(),
        revision_id: revision_id.to_string(),
        payment_id: pending.id.clone(),
        kind,
        direction: kind.direction(),
        amount: applied.abs(),
        status: AdjustmentStatus::Pending,
        created_at: now,
        processed_at: None,
    });
    plan.effects.pending_adjusted.push(PendingAdjusted {
        payment_id: pending.id.clone(),
        amount_delta: applied,
    });
    plan.effects.adjustment_ids.push(adjustment_id);
    plan.updated_payments.push(updated);
}

/// Create a brand-new pending payment for an uncollected positive delta
fn create_pending(
    plan: &mut AllocationPlan,
    order_id: &str,
    revision_id: &str,
    amount: i64,
    kind: PaymentKind,
    related_payment_id: Option<String>,
    now: i64,
) {
    let payment_id = uuid::Uuid::new_v4().to_string();
    plan.new_payments.push(Payment {
        id: payment_id.clone(),
        order_id: order_id.to_string(),
        method: "UNSPECIFIED".to_string(),
        status: PaymentStatus::Pending,
        amount,
        kind,
        is_adjustment: true,
        direction: Some(PaymentDirection::Charge),
        related_payment_id,
        revision_id: Some(revision_id.to_string()),
        transaction_ref: None,
        created_at: now,
        paid_at: None,
    });
    let adjustment_id = uuid::Uuid::new_v4().to_string();
    plan.adjustments.push(PaymentAdjustment {
        id: adjustment_id.clone(),
        order_id: order_id.to_string(),
        revision_id: revision_id.to_string(),
        payment_id: payment_id.clone(),
        kind: AdjustmentKind::IncreasePending,
        direction: PaymentDirection::Charge,
        amount,
        status: AdjustmentStatus::Pending,
        created_at: now,
        processed_at: None,
    });
    plan.effects.new_pending_payment_id = Some(payment_id);
    plan.effects.adjustment_ids.push(adjustment_id);
}
