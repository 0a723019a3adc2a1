//! Order API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::common::error::{AppResponse, AppResult, ok};
use crate::core::AppState;
use crate::orders::engine::{OpenOrderRequest, RecordPaymentRequest};
use shared::order::Order;
use shared::payment::{Payment, PaymentAdjustment};
use shared::revision::{
    Actor, Revision, RevisionOp, RevisionOutcome, RevisionReason, RevisionRequest,
};

/// Open a new order
pub async fn open(
    State(state): State<AppState>,
    Json(payload): Json<OpenOrderRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.engine.open_order(payload)?;
    Ok(ok(order))
}

/// Get the current order snapshot
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.engine.get_order(&id)?;
    Ok(ok(order))
}

/// Revision submission body; the order id comes from the path
#[derive(Debug, Deserialize)]
pub struct SubmitRevisionRequest {
    pub operations: Vec<RevisionOp>,
    pub reason: RevisionReason,
    pub actor: Actor,
    #[serde(default)]
    pub approved_by: Option<Actor>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub base_version: Option<u64>,
}

/// Submit a revision - the single mutation entry point
pub async fn submit_revision(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SubmitRevisionRequest>,
) -> AppResult<Json<AppResponse<RevisionOutcome>>> {
    let outcome = state.engine.submit_revision(RevisionRequest {
        order_id: id,
        operations: payload.operations,
        reason: payload.reason,
        actor: payload.actor,
        approved_by: payload.approved_by,
        idempotency_key: payload.idempotency_key,
        base_version: payload.base_version,
    })?;
    Ok(ok(outcome))
}

/// Audit timeline: every committed revision for the order
pub async fn list_revisions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<Revision>>>> {
    let revisions = state.engine.get_revisions(&id)?;
    Ok(ok(revisions))
}

/// Payment records for the order
pub async fn list_payments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<Payment>>>> {
    let payments = state.engine.get_payments(&id)?;
    Ok(ok(payments))
}

/// Record a payment taken outside the allocator (e.g. a down payment)
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RecordPaymentRequest>,
) -> AppResult<Json<AppResponse<Payment>>> {
    let payment = state.engine.record_payment(&id, payload)?;
    Ok(ok(payment))
}

/// Kitchen status update body
#[derive(Debug, Deserialize)]
pub struct KitchenStatusRequest {
    pub line_id: String,
    pub status: shared::order::KitchenStatus,
}

/// Advance a line's kitchen status (kitchen flow callback)
pub async fn update_kitchen_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<KitchenStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .engine
        .update_kitchen_status(&id, &payload.line_id, payload.status)?;
    Ok(ok(order))
}

/// Allocation audit records for the order
pub async fn list_adjustments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<PaymentAdjustment>>>> {
    let adjustments = state.engine.get_adjustments(&id)?;
    Ok(ok(adjustments))
}

/// Ledger verification result
#[derive(Debug, Serialize)]
pub struct LedgerVerification {
    pub order_id: String,
    pub intact: bool,
    pub entry_count: usize,
}

/// Verify the order's ledger hash chain end to end
pub async fn verify_ledger(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<LedgerVerification>>> {
    let intact = state.engine.verify_ledger(&id)?;
    let entry_count = state.engine.get_revisions(&id)?.len();
    Ok(ok(LedgerVerification {
        order_id: id,
        intact,
        entry_count,
    }))
}
