//! End-to-end revision flows against an in-memory engine
//!
//! Covers the full mutation surface: open, revise, allocate, capture,
//! settle, plus the guard, idempotency and concurrency properties.

use pos_server::catalog::{CatalogStore, InMemoryCatalog};
use pos_server::orders::engine::{
    LineInput, OpenOrderRequest, RecordPaymentRequest, RevisionEngine,
};
use pos_server::orders::ledger;
use pos_server::payments::settle::CaptureResult;
use pos_server::storage::OrderStore;
use shared::order::{DiscountConfig, KitchenStatus, Order};
use shared::payment::{
    AdjustmentKind, AdjustmentStatus, PaymentDirection, PaymentKind, PaymentStatus,
};
use shared::revision::{Actor, RevisionOp, RevisionReason, RevisionRequest};
use shared::RevisionError;
use std::sync::Arc;

fn seeded_catalog() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new();
    for (id, name, price) in [
        ("nasi-goreng", "Nasi Goreng", 10000),
        ("es-teh", "Es Teh", 15000),
        ("rendang", "Rendang", 28000),
        ("sate", "Sate Ayam", 5000),
    ] {
        catalog.upsert(shared::catalog::CatalogItem {
            id: id.to_string(),
            name: name.to_string(),
            price,
            addon_groups: vec![],
            toppings: vec![],
        });
    }
    catalog
}

fn test_engine() -> RevisionEngine {
    let store = OrderStore::open_in_memory().unwrap();
    let catalog: Arc<dyn CatalogStore> = Arc::new(seeded_catalog());
    RevisionEngine::new(store, catalog)
}

fn actor() -> Actor {
    Actor { id: "emp-7".to_string(), name: "Sari".to_string() }
}

fn reason(code: &str) -> RevisionReason {
    RevisionReason { code: code.to_string(), note: None }
}

fn line_input(catalog_item_id: &str, quantity: u32) -> LineInput {
    LineInput {
        catalog_item_id: catalog_item_id.to_string(),
        quantity,
        addon_ids: vec![],
        topping_ids: vec![],
        notes: None,
    }
}

fn open_plain_order(engine: &RevisionEngine, items: Vec<LineInput>) -> Order {
    engine
        .open_order(OpenOrderRequest {
            table_name: Some("T1".to_string()),
            guest_count: 2,
            items,
            discount: DiscountConfig::default(),
            tax_percent: 0.0,
            service_percent: 0.0,
        })
        .unwrap()
}

fn add_op(catalog_item_id: &str, quantity: u32) -> RevisionOp {
    RevisionOp::AddItem {
        catalog_item_id: catalog_item_id.to_string(),
        quantity,
        addon_ids: vec![],
        topping_ids: vec![],
        notes: None,
    }
}

fn request(order_id: &str, operations: Vec<RevisionOp>) -> RevisionRequest {
    RevisionRequest {
        order_id: order_id.to_string(),
        operations,
        reason: reason("CUSTOMER_REQUEST"),
        actor: actor(),
        approved_by: None,
        idempotency_key: None,
        base_version: None,
    }
}

// Scenario: unpaid order, item added. Delta equals the new line's subtotal
// and a fresh collectible is opened for it.
#[test]
fn add_item_on_unpaid_order() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 2)]);
    assert_eq!(order.totals.grand_total, 20000);

    let outcome = engine
        .submit_revision(request(&order.id, vec![add_op("es-teh", 1)]))
        .unwrap();

    assert_eq!(outcome.revision.delta_amount, 15000);
    assert_eq!(outcome.order.totals.grand_total, 35000);
    assert_eq!(outcome.order.version, 2);
    assert_eq!(outcome.revision.diff.added.len(), 1);
    // No existing payment was touched; the delta opened a new pending charge
    assert!(outcome.effects.pending_adjusted.is_empty());
    let pending_id = outcome.effects.new_pending_payment_id.clone().unwrap();
    let payments = engine.get_payments(&order.id).unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].id, pending_id);
    assert_eq!(payments[0].amount, 15000);
    assert_eq!(payments[0].kind, PaymentKind::Full);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
    // The added line is tagged with the pending payment that covers it
    let added_id = &outcome.revision.diff.added[0];
    let added_line = outcome.order.line(added_id).unwrap();
    assert_eq!(added_line.payment_id.as_deref(), Some(pending_id.as_str()));
    // New batch for the kitchen ticket
    assert_eq!(added_line.batch_number, 2);
    assert_eq!(outcome.order.current_batch, 2);
}

// Scenario: fully settled order, line removed. No pending exists, so the
// delta becomes an immediately-settled refund linked to the original payment.
#[test]
fn remove_line_on_settled_order_refunds_cash() {
    let engine = test_engine();
    let order = open_plain_order(
        &engine,
        vec![line_input("nasi-goreng", 2), line_input("es-teh", 1)],
    );
    assert_eq!(order.totals.grand_total, 35000);
    let settled = engine
        .record_payment(
            &order.id,
            RecordPaymentRequest {
                method: "CASH".to_string(),
                amount: 35000,
                kind: PaymentKind::Full,
                settled: true,
            },
        )
        .unwrap();

    let removed_line_id = order.items[0].id.clone();
    let outcome = engine
        .submit_revision(request(
            &order.id,
            vec![RevisionOp::RemoveItem { line_id: removed_line_id.clone() }],
        ))
        .unwrap();

    assert_eq!(outcome.revision.delta_amount, -20000);
    assert_eq!(outcome.order.totals.grand_total, 15000);
    assert_eq!(outcome.revision.diff.removed, vec![removed_line_id]);

    let refund_id = outcome.effects.refund_payment_id.clone().unwrap();
    let refund = engine
        .get_payments(&order.id)
        .unwrap()
        .into_iter()
        .find(|p| p.id == refund_id)
        .unwrap();
    assert_eq!(refund.amount, 20000);
    assert_eq!(refund.status, PaymentStatus::Settlement);
    assert_eq!(refund.direction, Some(PaymentDirection::Refund));
    assert_eq!(refund.related_payment_id.as_deref(), Some(settled.id.as_str()));
    assert!(refund.paid_at.is_some());

    let adjustments = engine.get_adjustments(&order.id).unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].kind, AdjustmentKind::Refund);
    assert_eq!(adjustments[0].status, AdjustmentStatus::Settlement);
}

// Scenario: settled down payment plus a pending final charge; a quantity
// increase lands on the pending charge, no new payment row.
#[test]
fn quantity_increase_lands_on_pending_payment() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("sate", 1)]);
    assert_eq!(order.totals.grand_total, 5000);

    engine
        .record_payment(
            &order.id,
            RecordPaymentRequest {
                method: "TRANSFER".to_string(),
                amount: 20000,
                kind: PaymentKind::DownPayment,
                settled: true,
            },
        )
        .unwrap();
    let pending = engine
        .record_payment(
            &order.id,
            RecordPaymentRequest {
                method: "CASH".to_string(),
                amount: 15000,
                kind: PaymentKind::FinalPayment,
                settled: false,
            },
        )
        .unwrap();

    let line_id = order.items[0].id.clone();
    let outcome = engine
        .submit_revision(request(
            &order.id,
            vec![RevisionOp::UpdateQuantity { line_id, from_qty: 1, to_qty: 2 }],
        ))
        .unwrap();

    assert_eq!(outcome.revision.delta_amount, 5000);
    assert!(outcome.effects.new_pending_payment_id.is_none());
    assert_eq!(outcome.effects.pending_adjusted.len(), 1);
    assert_eq!(outcome.effects.pending_adjusted[0].payment_id, pending.id);
    assert_eq!(outcome.effects.pending_adjusted[0].amount_delta, 5000);

    let stored_pending = engine
        .get_payments(&order.id)
        .unwrap()
        .into_iter()
        .find(|p| p.id == pending.id)
        .unwrap();
    assert_eq!(stored_pending.amount, 20000);

    let adjustments = engine.get_adjustments(&order.id).unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].kind, AdjustmentKind::IncreasePending);
}

// Scenario: cooking line, removal attempted. The whole revision is rejected
// and nothing changes - no version bump, no ledger entry.
#[test]
fn committed_line_rejects_revision_untouched() {
    let engine = test_engine();
    let order = open_plain_order(
        &engine,
        vec![line_input("nasi-goreng", 2), line_input("es-teh", 1)],
    );
    let cooking_line = order.items[0].id.clone();
    let order = engine
        .update_kitchen_status(&order.id, &cooking_line, KitchenStatus::Cooking)
        .unwrap();
    let version_before = order.version;

    // Batch also contains a valid add: all-or-nothing means it must not land
    let result = engine.submit_revision(request(
        &order.id,
        vec![
            add_op("sate", 1),
            RevisionOp::RemoveItem { line_id: cooking_line },
        ],
    ));
    assert!(matches!(result, Err(RevisionError::ItemAlreadyCommitted(_))));

    let after = engine.get_order(&order.id).unwrap();
    assert_eq!(after.version, version_before);
    assert_eq!(after.items.len(), 2);
    assert_eq!(after.totals, order.totals);
    assert!(engine.get_revisions(&order.id).unwrap().is_empty());
    assert!(engine.get_payments(&order.id).unwrap().is_empty());
}

// Scenario: substitution is the out-of-stock remedy and works on a cooking
// line, repricing it from the catalog.
#[test]
fn substitute_cooking_line_reprices() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 2)]);
    let line_id = order.items[0].id.clone();
    engine
        .update_kitchen_status(&order.id, &line_id, KitchenStatus::Cooking)
        .unwrap();

    let outcome = engine
        .submit_revision(request(
            &order.id,
            vec![RevisionOp::SubstituteItem {
                line_id: line_id.clone(),
                new_catalog_item_id: "rendang".to_string(),
                addon_ids: vec![],
                topping_ids: vec![],
            }],
        ))
        .unwrap();

    // 2 x 28000 replacing 2 x 10000
    assert_eq!(outcome.revision.delta_amount, 36000);
    let line = outcome.order.line(&line_id).unwrap();
    assert_eq!(line.catalog_item_id, "rendang");
    assert_eq!(line.quantity, 2);
    assert_eq!(line.kitchen_status, KitchenStatus::Pending);
    assert_eq!(outcome.revision.diff.updated, vec![line_id]);
}

// Scenario: two revisions built from the same snapshot version; exactly one
// commits, the other fails with a version mismatch.
#[test]
fn concurrent_revisions_one_wins() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 1)]);
    let base = order.version;

    let mut first = request(&order.id, vec![add_op("es-teh", 1)]);
    first.base_version = Some(base);
    engine.submit_revision(first).unwrap();

    let mut second = request(&order.id, vec![add_op("sate", 1)]);
    second.base_version = Some(base);
    let result = engine.submit_revision(second);
    assert!(matches!(
        result,
        Err(RevisionError::OrderVersionMismatch { expected: 1, actual: 2 })
    ));

    // Retry from a fresh snapshot succeeds
    let retry = engine
        .submit_revision(request(&order.id, vec![add_op("sate", 1)]))
        .unwrap();
    assert_eq!(retry.order.version, 3);
}

#[test]
fn idempotent_resubmission_replays_without_new_effects() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 1)]);

    let mut req = request(&order.id, vec![add_op("es-teh", 1)]);
    req.idempotency_key = Some("edit-421".to_string());
    let first = engine.submit_revision(req.clone()).unwrap();
    assert!(!first.replayed);

    let replay = engine.submit_revision(req).unwrap();
    assert!(replay.replayed);
    assert_eq!(replay.revision.id, first.revision.id);
    assert_eq!(replay.effects.new_pending_payment_id, first.effects.new_pending_payment_id);

    // No second ledger entry, payment or adjustment appeared
    assert_eq!(engine.get_revisions(&order.id).unwrap().len(), 1);
    assert_eq!(engine.get_payments(&order.id).unwrap().len(), 1);
    assert_eq!(engine.get_adjustments(&order.id).unwrap().len(), 1);
    assert_eq!(engine.get_order(&order.id).unwrap().version, 2);
}

#[test]
fn totals_keep_the_rates_the_order_was_opened_under() {
    let engine = test_engine();
    let order = engine
        .open_order(OpenOrderRequest {
            table_name: None,
            guest_count: 1,
            items: vec![line_input("nasi-goreng", 2)],
            discount: DiscountConfig::default(),
            tax_percent: 10.0,
            service_percent: 5.0,
        })
        .unwrap();
    assert_eq!(order.totals.total_tax, 2000);
    assert_eq!(order.totals.total_service_fee, 1000);
    assert_eq!(order.totals.grand_total, 23000);

    let outcome = engine
        .submit_revision(request(&order.id, vec![add_op("es-teh", 1)]))
        .unwrap();

    let totals = outcome.order.totals;
    assert_eq!(totals.total_before_discount, 35000);
    assert_eq!(totals.total_tax, 3500);
    assert_eq!(totals.total_service_fee, 1750);
    assert_eq!(totals.grand_total, 40250);
    assert!(totals.is_consistent());
    // Grand delta includes the scaled tax and service portions
    assert_eq!(outcome.revision.delta_amount, 40250 - 23000);
    // Per-operation deltas stay at the line-subtotal level
    assert_eq!(outcome.revision.operations[0].price_delta, 15000);
}

#[test]
fn capture_approval_settles_adjustment_and_payment() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 1)]);
    let outcome = engine
        .submit_revision(request(&order.id, vec![add_op("es-teh", 1)]))
        .unwrap();
    let adjustment_id = outcome.effects.adjustment_ids[0].clone();

    let (adjustment, payment) = engine
        .capture_adjustment(&adjustment_id, "CARD", CaptureResult::Approved, Some("tx-99".into()))
        .unwrap();

    assert_eq!(adjustment.status, AdjustmentStatus::Settlement);
    assert_eq!(payment.status, PaymentStatus::Settlement);
    assert_eq!(payment.method, "CARD");
    assert_eq!(payment.transaction_ref.as_deref(), Some("tx-99"));
    assert!(payment.paid_at.is_some());
}

#[test]
fn capture_decline_leaves_balance_outstanding() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 1)]);
    let outcome = engine
        .submit_revision(request(&order.id, vec![add_op("es-teh", 1)]))
        .unwrap();
    let adjustment_id = outcome.effects.adjustment_ids[0].clone();

    let (adjustment, payment) = engine
        .capture_adjustment(&adjustment_id, "CARD", CaptureResult::Declined, None)
        .unwrap();

    assert_eq!(adjustment.status, AdjustmentStatus::Failed);
    assert_eq!(payment.status, PaymentStatus::Failed);
    // The order itself is untouched by the decline
    let after = engine.get_order(&order.id).unwrap();
    assert_eq!(after.version, outcome.order.version);
    assert_eq!(after.totals, outcome.order.totals);
}

#[test]
fn settle_mirrors_linked_adjustment() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 1)]);
    let outcome = engine
        .submit_revision(request(&order.id, vec![add_op("es-teh", 1)]))
        .unwrap();
    let payment_id = outcome.effects.new_pending_payment_id.unwrap();

    let payment = engine.settle_payment(&payment_id).unwrap();
    assert_eq!(payment.status, PaymentStatus::Settlement);

    let adjustments = engine.get_adjustments(&order.id).unwrap();
    assert_eq!(adjustments[0].status, AdjustmentStatus::Settlement);
    assert!(adjustments[0].processed_at.is_some());

    // Settling twice is rejected
    assert!(matches!(
        engine.settle_payment(&payment_id),
        Err(RevisionError::InvalidOperation(_))
    ));
}

#[test]
fn ledger_chain_verifies_and_detects_tampering() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 1)]);
    for op in [add_op("es-teh", 1), add_op("sate", 2), add_op("rendang", 1)] {
        engine.submit_revision(request(&order.id, vec![op])).unwrap();
    }
    assert!(engine.verify_ledger(&order.id).unwrap());

    let revisions = engine.get_revisions(&order.id).unwrap();
    assert_eq!(revisions.len(), 3);
    assert_eq!(revisions[0].prev_hash, ledger::GENESIS_HASH);

    // Rewrite history: bump a committed delta and write it back
    let mut tampered = revisions[1].clone();
    tampered.delta_amount += 100000;
    let txn = engine.store().begin_write().unwrap();
    engine.store().store_revision(&txn, &tampered).unwrap();
    txn.commit().unwrap();

    assert!(!engine.verify_ledger(&order.id).unwrap());
}

#[test]
fn multi_operation_revision_is_one_atomic_delta() {
    let engine = test_engine();
    let order = open_plain_order(
        &engine,
        vec![line_input("nasi-goreng", 2), line_input("es-teh", 1)],
    );
    let kept = order.items[0].id.clone();
    let dropped = order.items[1].id.clone();

    let outcome = engine
        .submit_revision(request(
            &order.id,
            vec![
                RevisionOp::UpdateQuantity { line_id: kept, from_qty: 2, to_qty: 3 },
                RevisionOp::RemoveItem { line_id: dropped },
                add_op("sate", 2),
            ],
        ))
        .unwrap();

    // +10000 - 15000 + 10000
    assert_eq!(outcome.revision.delta_amount, 5000);
    assert_eq!(outcome.revision.operations.len(), 3);
    let op_sum: i64 = outcome.revision.operations.iter().map(|o| o.price_delta).sum();
    assert_eq!(op_sum, 5000);
    assert_eq!(engine.get_revisions(&order.id).unwrap().len(), 1);
    assert!(outcome.order.totals.is_consistent());
}

#[test]
fn unknown_order_and_unknown_line_are_fatal() {
    let engine = test_engine();
    assert!(matches!(
        engine.submit_revision(request("ghost-order", vec![add_op("sate", 1)])),
        Err(RevisionError::OrderNotFound(_))
    ));

    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 1)]);
    assert!(matches!(
        engine.submit_revision(request(
            &order.id,
            vec![RevisionOp::RemoveItem { line_id: "ghost-line".to_string() }],
        )),
        Err(RevisionError::ItemNotFound(_))
    ));
    assert!(matches!(
        engine.submit_revision(request(&order.id, vec![add_op("ghost-item", 1)])),
        Err(RevisionError::CatalogItemNotFound(_))
    ));
    // Nothing committed for any of the failures
    assert!(engine.get_revisions(&order.id).unwrap().is_empty());
    assert_eq!(engine.get_order(&order.id).unwrap().version, 1);
}

#[test]
fn empty_operation_batch_is_rejected() {
    let engine = test_engine();
    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 1)]);
    assert!(matches!(
        engine.submit_revision(request(&order.id, vec![])),
        Err(RevisionError::InvalidOperation(_))
    ));
}

#[test]
fn change_notices_follow_commits() {
    let engine = test_engine();
    let mut rx = engine.subscribe();

    let order = open_plain_order(&engine, vec![line_input("nasi-goreng", 1)]);
    let outcome = engine
        .submit_revision(request(&order.id, vec![add_op("es-teh", 1)]))
        .unwrap();

    // Open notice
    let notice = rx.try_recv().unwrap();
    assert_eq!(notice.order_id(), order.id);
    // Revision notice carries the delta and effects
    match rx.try_recv().unwrap() {
        shared::notice::ChangeNotice::OrderChanged { new_version, delta_amount, effects, .. } => {
            assert_eq!(new_version, 2);
            assert_eq!(delta_amount, outcome.revision.delta_amount);
            assert_eq!(effects.new_pending_payment_id, outcome.effects.new_pending_payment_id);
        }
        other => panic!("expected OrderChanged, got {other:?}"),
    }

    // A failed revision emits nothing
    let _ = engine.submit_revision(request(&order.id, vec![]));
    assert!(rx.try_recv().is_err());
}
