//! Payment API handlers - capture and settle

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::common::error::{AppResponse, AppResult, ok};
use crate::core::AppState;
use crate::payments::settle::CaptureResult;
use shared::payment::{Payment, PaymentAdjustment};

/// Capture request carrying the external gateway outcome
#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub method: String,
    pub result: CaptureResult,
    #[serde(default)]
    pub transaction_ref: Option<String>,
}

/// Capture response: the adjustment and its mirrored payment
#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub adjustment: PaymentAdjustment,
    pub payment: Payment,
}

/// Apply a gateway result to a charge adjustment
pub async fn capture(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CaptureRequest>,
) -> AppResult<Json<AppResponse<CaptureResponse>>> {
    let (adjustment, payment) = state.engine.capture_adjustment(
        &id,
        &payload.method,
        payload.result,
        payload.transaction_ref,
    )?;
    Ok(ok(CaptureResponse { adjustment, payment }))
}

/// Confirm collection of a pending payment
pub async fn settle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Payment>>> {
    let payment = state.engine.settle_payment(&id)?;
    Ok(ok(payment))
}
