//! RevisionEngine - the single mutation entry point for live orders
//!
//! # Revision flow
//!
//! ```text
//! submit_revision(req)
//!     ├─ 1. Idempotency check (replay committed revision)
//!     ├─ 2. Snapshot read at version_from
//!     ├─ 3. Apply operations to a working copy (all-or-nothing)
//!     ├─ 4. Recompute totals under the order's implied tax/service rates
//!     ├─ 5. Diff item lists, derive the grand-total delta
//!     ├─ 6. Begin write transaction
//!     │      ├─ version guard (conditional write)
//!     │      ├─ allocate delta against existing payments
//!     │      ├─ order + ledger entry + payments + adjustments
//!     │      └─ commit (or abort leaving nothing behind)
//!     └─ 7. Broadcast change notice
//! ```
//!
//! Everything between begin and commit shares one redb transaction; a
//! failure on any path aborts the whole revision.

use crate::catalog::CatalogStore;
use crate::orders::diff::diff_items;
use crate::orders::ledger;
use crate::orders::ops::{ApplyOp, OpAction, OpContext};
use crate::payments;
use crate::payments::allocator::allocate;
use crate::payments::settle::CaptureResult;
use crate::pricing::totals::TaxServiceRates;
use crate::pricing::{compute_totals, implied_rates};
use crate::storage::OrderStore;
use serde::{Deserialize, Serialize};
use shared::notice::ChangeNotice;
use shared::order::{DiscountConfig, KitchenStatus, Order};
use shared::payment::{AllocationEffects, Payment, PaymentAdjustment, PaymentDirection, PaymentKind, PaymentStatus, PendingAdjusted};
use shared::revision::{Revision, RevisionOp, RevisionOutcome, RevisionRequest};
use shared::{RevisionError, now_millis};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Change notice channel capacity
const NOTICE_CHANNEL_CAPACITY: usize = 4096;

/// Upper bound on operations per revision
const MAX_OPERATIONS_PER_REVISION: usize = 100;

/// One line of an order-intake request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineInput {
    pub catalog_item_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub addon_ids: Vec<String>,
    #[serde(default)]
    pub topping_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Order intake payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default = "default_guest_count")]
    pub guest_count: i32,
    #[serde(default)]
    pub items: Vec<LineInput>,
    #[serde(default)]
    pub discount: DiscountConfig,
    /// Opening tax rate in percent; preserved for the order's whole life
    #[serde(default)]
    pub tax_percent: f64,
    /// Opening service-fee rate in percent
    #[serde(default)]
    pub service_percent: f64,
}

fn default_guest_count() -> i32 {
    1
}

/// Direct payment intake (e.g. a settled down payment)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub method: String,
    /// Amount in minor units
    pub amount: i64,
    #[serde(default)]
    pub kind: PaymentKind,
    /// True when the money already moved (recorded directly as settlement)
    #[serde(default)]
    pub settled: bool,
}

/// The revision engine
///
/// Cheap to clone; all state lives in the store and the broadcast channel.
pub struct RevisionEngine {
    store: OrderStore,
    catalog: Arc<dyn CatalogStore>,
    notice_tx: broadcast::Sender<ChangeNotice>,
}

impl std::fmt::Debug for RevisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionEngine")
            .field("store", &"<OrderStore>")
            .finish()
    }
}

impl Clone for RevisionEngine {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            catalog: self.catalog.clone(),
            notice_tx: self.notice_tx.clone(),
        }
    }
}

impl RevisionEngine {
    pub fn new(store: OrderStore, catalog: Arc<dyn CatalogStore>) -> Self {
        let (notice_tx, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            store,
            catalog,
            notice_tx,
        }
    }

    /// Subscribe to change notices (emitted only after commit)
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.notice_tx.subscribe()
    }

    /// Underlying storage (queries, tests)
    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    fn broadcast(&self, notice: ChangeNotice) {
        if self.notice_tx.send(notice).is_err() {
            tracing::debug!("Change notice dropped: no active receivers");
        }
    }

    // ========== Order Intake ==========

    /// Open a new order, pricing its initial lines through the resolver
    pub fn open_order(&self, req: OpenOrderRequest) -> Result<Order, RevisionError> {
        let order_id = uuid::Uuid::new_v4().to_string();
        let mut items = Vec::new();
        {
            let mut ctx = OpContext {
                catalog: self.catalog.as_ref(),
                items: &mut items,
                batch_number: 1,
            };
            for input in &req.items {
                let op = RevisionOp::AddItem {
                    catalog_item_id: input.catalog_item_id.clone(),
                    quantity: input.quantity,
                    addon_ids: input.addon_ids.clone(),
                    topping_ids: input.topping_ids.clone(),
                    notes: input.notes.clone(),
                };
                OpAction::from(&op).apply(&mut ctx)?;
            }
        }

        let rates = TaxServiceRates::from_percent(req.tax_percent, req.service_percent);
        let totals = compute_totals(&items, &req.discount, &rates);

        let mut order = Order::new(order_id);
        order.table_name = req.table_name;
        order.guest_count = req.guest_count;
        order.items = items;
        order.discount = req.discount;
        order.totals = totals;

        let txn = self.store.begin_write()?;
        self.store.store_order(&txn, &order)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            grand_total = order.totals.grand_total,
            item_count = order.items.len(),
            "Order opened"
        );
        self.broadcast(ChangeNotice::OrderChanged {
            order_id: order.id.clone(),
            new_version: order.version,
            delta_amount: order.totals.grand_total,
            effects: AllocationEffects::default(),
        });
        Ok(order)
    }

    /// Record a payment taken outside the allocator (e.g. a down payment)
    pub fn record_payment(
        &self,
        order_id: &str,
        req: RecordPaymentRequest,
    ) -> Result<Payment, RevisionError> {
        if req.amount <= 0 {
            return Err(RevisionError::InvalidOperation(
                "payment amount must be positive".to_string(),
            ));
        }
        if req.method.trim().is_empty() {
            return Err(RevisionError::InvalidOperation(
                "payment method must not be empty".to_string(),
            ));
        }
        self.store
            .get_order(order_id)?
            .ok_or_else(|| RevisionError::OrderNotFound(order_id.to_string()))?;

        let now = now_millis();
        let payment = Payment {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            method: req.method,
            status: if req.settled {
                PaymentStatus::Settlement
            } else {
                PaymentStatus::Pending
            },
            amount: req.amount,
            kind: req.kind,
            is_adjustment: false,
            direction: None,
            related_payment_id: None,
            revision_id: None,
            transaction_ref: None,
            created_at: now,
            paid_at: req.settled.then_some(now),
        };

        let txn = self.store.begin_write()?;
        self.store.store_payment(&txn, &payment)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        self.broadcast(ChangeNotice::PaymentChanged {
            order_id: order_id.to_string(),
            payment_id: payment.id.clone(),
            status: payment.status,
            adjustment_id: None,
            adjustment_status: None,
        });
        Ok(payment)
    }

    /// Advance a line's kitchen status (driven by the kitchen flow)
    ///
    /// Bumps the order version: a revision composed before the kitchen
    /// committed must lose the race rather than remove a line that is
    /// already cooking.
    pub fn update_kitchen_status(
        &self,
        order_id: &str,
        line_id: &str,
        status: KitchenStatus,
    ) -> Result<Order, RevisionError> {
        let txn = self.store.begin_write()?;
        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| RevisionError::OrderNotFound(order_id.to_string()))?;
        let line = order
            .items
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| RevisionError::ItemNotFound(line_id.to_string()))?;
        line.kitchen_status = status;
        order.version += 1;
        order.updated_at = now_millis();

        self.store.store_order(&txn, &order)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::debug!(order_id, line_id, ?status, "Kitchen status updated");
        Ok(order)
    }

    // ========== Revision ==========

    /// Apply a batch of item operations as one atomic, audited revision
    pub fn submit_revision(&self, req: RevisionRequest) -> Result<RevisionOutcome, RevisionError> {
        if req.operations.is_empty() {
            return Err(RevisionError::InvalidOperation(
                "revision carries no operations".to_string(),
            ));
        }
        if req.operations.len() > MAX_OPERATIONS_PER_REVISION {
            return Err(RevisionError::InvalidOperation(format!(
                "revision exceeds {MAX_OPERATIONS_PER_REVISION} operations"
            )));
        }

        // Replay a previously committed revision with the same key
        if let Some(key) = &req.idempotency_key
            && let Some((order_id, version_to)) = self.store.lookup_idempotency(key)?
        {
            tracing::info!(idempotency_key = %key, order_id = %order_id, "Replaying committed revision");
            return self.replay_revision(&order_id, version_to);
        }

        // Snapshot read; pricing happens outside the write transaction
        let order = self
            .store
            .get_order(&req.order_id)?
            .ok_or_else(|| RevisionError::OrderNotFound(req.order_id.clone()))?;
        let version_from = req.base_version.unwrap_or(order.version);
        if version_from != order.version {
            return Err(RevisionError::OrderVersionMismatch {
                expected: version_from,
                actual: order.version,
            });
        }

        // Working copy; a revision containing adds opens the next batch
        let mut items = order.items.clone();
        let has_add = req
            .operations
            .iter()
            .any(|op| matches!(op, RevisionOp::AddItem { .. }));
        let batch_number = if has_add {
            order.current_batch + 1
        } else {
            order.current_batch
        };

        let mut operations = Vec::with_capacity(req.operations.len());
        {
            let mut ctx = OpContext {
                catalog: self.catalog.as_ref(),
                items: &mut items,
                batch_number,
            };
            for op in &req.operations {
                operations.push(OpAction::from(op).apply(&mut ctx)?);
            }
        }

        // Totals under the rates implied by the pre-edit totals
        let rates = implied_rates(&order.totals);
        let new_totals = compute_totals(&items, &order.discount, &rates);

        // Per-operation deltas are line-subtotal movements; they must add up
        // to the before-discount movement exactly. Disagreement means a
        // handler and the calculator diverged.
        let op_delta: i64 = operations.iter().map(|o| o.price_delta).sum();
        let subtotal_delta = new_totals.total_before_discount - order.totals.total_before_discount;
        if op_delta != subtotal_delta {
            tracing::error!(
                order_id = %req.order_id,
                op_delta,
                subtotal_delta,
                "Operation deltas disagree with recomputed totals"
            );
            return Err(RevisionError::Internal(
                "operation deltas disagree with recomputed totals".to_string(),
            ));
        }
        if !new_totals.is_consistent() {
            return Err(RevisionError::Internal(
                "recomputed totals violate the grand-total invariant".to_string(),
            ));
        }

        let delta_amount = new_totals.grand_total - order.totals.grand_total;
        let diff = diff_items(&order.items, &items);
        let now = now_millis();
        let revision_id = uuid::Uuid::new_v4().to_string();

        // Atomic commit: conditional order write + ledger + payment effects
        let txn = self.store.begin_write()?;

        if let Some(key) = &req.idempotency_key
            && let Some((order_id, version_to)) = self.store.lookup_idempotency_txn(&txn, key)?
        {
            drop(txn);
            return self.replay_revision(&order_id, version_to);
        }

        let stored = self
            .store
            .get_order_txn(&txn, &req.order_id)?
            .ok_or_else(|| RevisionError::OrderNotFound(req.order_id.clone()))?;
        if stored.version != version_from {
            return Err(RevisionError::OrderVersionMismatch {
                expected: version_from,
                actual: stored.version,
            });
        }

        let payments = self.store.get_payments_for_order_txn(&txn, &req.order_id)?;
        let plan = allocate(&req.order_id, &revision_id, delta_amount, &payments, now);

        // Lines added by this revision are tagged with a brand-new pending
        // payment; existing lines are never re-tagged.
        if let Some(pending_id) = &plan.effects.new_pending_payment_id {
            for line in items.iter_mut() {
                if diff.added.contains(&line.id) {
                    line.payment_id = Some(pending_id.clone());
                }
            }
        }

        let prev_hash = self
            .store
            .ledger_head_txn(&txn, &req.order_id)?
            .unwrap_or_else(|| ledger::GENESIS_HASH.to_string());
        let mut revision = Revision {
            id: revision_id,
            order_id: req.order_id.clone(),
            version_from,
            version_to: version_from + 1,
            reason: req.reason.clone(),
            created_by: req.actor.clone(),
            approved_by: req.approved_by.clone(),
            delta_amount,
            operations,
            diff,
            idempotency_key: req.idempotency_key.clone(),
            created_at: now,
            prev_hash,
            curr_hash: String::new(),
        };
        revision.curr_hash = ledger::chain_hash(&revision);

        let mut updated = order;
        updated.items = items;
        updated.totals = new_totals;
        updated.version = version_from + 1;
        updated.current_batch = batch_number;
        updated.updated_at = now;

        self.store.store_order(&txn, &updated)?;
        self.store.store_revision(&txn, &revision)?;
        self.store
            .set_ledger_head(&txn, &req.order_id, &revision.curr_hash)?;
        for payment in plan.updated_payments.iter().chain(plan.new_payments.iter()) {
            self.store.store_payment(&txn, payment)?;
        }
        for adjustment in &plan.adjustments {
            self.store.store_adjustment(&txn, adjustment)?;
        }
        if let Some(key) = &req.idempotency_key {
            self.store
                .mark_idempotent(&txn, key, &req.order_id, updated.version)?;
        }
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(
            order_id = %updated.id,
            revision_id = %revision.id,
            new_version = updated.version,
            delta_amount,
            "Revision committed"
        );
        self.broadcast(ChangeNotice::OrderChanged {
            order_id: updated.id.clone(),
            new_version: updated.version,
            delta_amount,
            effects: plan.effects.clone(),
        });

        Ok(RevisionOutcome {
            revision,
            order: updated,
            effects: plan.effects,
            replayed: false,
        })
    }

    /// Answer an idempotent resubmission from committed state
    fn replay_revision(
        &self,
        order_id: &str,
        version_to: u64,
    ) -> Result<RevisionOutcome, RevisionError> {
        let revision = self
            .store
            .get_revision(order_id, version_to)?
            .ok_or_else(|| {
                RevisionError::Internal(format!(
                    "idempotency key points at missing revision {order_id}@{version_to}"
                ))
            })?;
        let order = self
            .store
            .get_order(order_id)?
            .ok_or_else(|| RevisionError::OrderNotFound(order_id.to_string()))?;
        let effects = self.effects_for_revision(&revision)?;
        Ok(RevisionOutcome {
            revision,
            order,
            effects,
            replayed: true,
        })
    }

    /// Rebuild a committed revision's effects from stored payment state
    fn effects_for_revision(
        &self,
        revision: &Revision,
    ) -> Result<AllocationEffects, RevisionError> {
        let mut effects = AllocationEffects::default();
        let payments = self.store.get_payments_for_order(&revision.order_id)?;
        let adjustments = self.store.get_adjustments_for_order(&revision.order_id)?;

        let created_here: Vec<&Payment> = payments
            .iter()
            .filter(|p| p.revision_id.as_deref() == Some(revision.id.as_str()))
            .collect();
        effects.new_pending_payment_id = created_here
            .iter()
            .find(|p| p.direction == Some(PaymentDirection::Charge))
            .map(|p| p.id.clone());
        effects.refund_payment_id = created_here
            .iter()
            .find(|p| p.direction == Some(PaymentDirection::Refund))
            .map(|p| p.id.clone());

        for adjustment in adjustments
            .iter()
            .filter(|a| a.revision_id == revision.id)
        {
            effects.adjustment_ids.push(adjustment.id.clone());
            // In-place changes only; payments this revision created are
            // already reported above.
            let created = created_here.iter().any(|p| p.id == adjustment.payment_id);
            if !created {
                let sign = match adjustment.direction {
                    PaymentDirection::Charge => 1,
                    PaymentDirection::Refund => -1,
                };
                effects.pending_adjusted.push(PendingAdjusted {
                    payment_id: adjustment.payment_id.clone(),
                    amount_delta: sign * adjustment.amount,
                });
            }
        }
        Ok(effects)
    }

    // ========== Capture / Settle ==========

    /// Apply an external gateway result to a charge adjustment
    pub fn capture_adjustment(
        &self,
        adjustment_id: &str,
        method: &str,
        result: CaptureResult,
        transaction_ref: Option<String>,
    ) -> Result<(PaymentAdjustment, Payment), RevisionError> {
        let now = now_millis();
        let txn = self.store.begin_write()?;
        let mut adjustment = self
            .store
            .get_adjustment_txn(&txn, adjustment_id)?
            .ok_or_else(|| RevisionError::AdjustmentNotFound(adjustment_id.to_string()))?;
        let mut payment = self
            .store
            .get_payment_txn(&txn, &adjustment.payment_id)?
            .ok_or_else(|| RevisionError::PaymentNotFound(adjustment.payment_id.clone()))?;

        payments::capture(&mut adjustment, &mut payment, method, result, now)?;
        payment.transaction_ref = transaction_ref;

        self.store.store_adjustment(&txn, &adjustment)?;
        self.store.store_payment(&txn, &payment)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(
            adjustment_id = %adjustment.id,
            payment_id = %payment.id,
            ?result,
            "Adjustment capture processed"
        );
        self.broadcast(ChangeNotice::PaymentChanged {
            order_id: payment.order_id.clone(),
            payment_id: payment.id.clone(),
            status: payment.status,
            adjustment_id: Some(adjustment.id.clone()),
            adjustment_status: Some(adjustment.status),
        });
        Ok((adjustment, payment))
    }

    /// Confirm collection of a pending payment; linked adjustments mirror it
    pub fn settle_payment(&self, payment_id: &str) -> Result<Payment, RevisionError> {
        let now = now_millis();
        let txn = self.store.begin_write()?;
        let mut payment = self
            .store
            .get_payment_txn(&txn, payment_id)?
            .ok_or_else(|| RevisionError::PaymentNotFound(payment_id.to_string()))?;

        payments::settle(&mut payment, now)?;
        self.store.store_payment(&txn, &payment)?;

        let mut mirrored = None;
        for mut adjustment in self.store.get_adjustments_for_payment_txn(&txn, payment_id)? {
            if adjustment.status == shared::payment::AdjustmentStatus::Pending {
                payments::mirror_adjustment(&mut adjustment, now);
                self.store.store_adjustment(&txn, &adjustment)?;
                mirrored = Some((adjustment.id.clone(), adjustment.status));
            }
        }
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(payment_id = %payment.id, "Payment settled");
        self.broadcast(ChangeNotice::PaymentChanged {
            order_id: payment.order_id.clone(),
            payment_id: payment.id.clone(),
            status: payment.status,
            adjustment_id: mirrored.as_ref().map(|(id, _)| id.clone()),
            adjustment_status: mirrored.map(|(_, status)| status),
        });
        Ok(payment)
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> Result<Order, RevisionError> {
        self.store
            .get_order(order_id)?
            .ok_or_else(|| RevisionError::OrderNotFound(order_id.to_string()))
    }

    pub fn get_revisions(&self, order_id: &str) -> Result<Vec<Revision>, RevisionError> {
        Ok(self.store.get_revisions_for_order(order_id)?)
    }

    pub fn get_payments(&self, order_id: &str) -> Result<Vec<Payment>, RevisionError> {
        Ok(self.store.get_payments_for_order(order_id)?)
    }

    pub fn get_adjustments(&self, order_id: &str) -> Result<Vec<PaymentAdjustment>, RevisionError> {
        Ok(self.store.get_adjustments_for_order(order_id)?)
    }

    /// Walk an order's ledger chain end to end
    pub fn verify_ledger(&self, order_id: &str) -> Result<bool, RevisionError> {
        let revisions = self.store.get_revisions_for_order(order_id)?;
        Ok(ledger::verify_chain(&revisions))
    }
}
