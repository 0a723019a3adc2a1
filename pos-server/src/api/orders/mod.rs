//! Order API module
//!
//! All item mutation goes through the revision endpoint; the rest is
//! read-only access to the order, its ledger and its payments.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

/// Order router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(handler::open))
        .route("/api/orders/{id}", get(handler::get_by_id))
        .route(
            "/api/orders/{id}/revisions",
            post(handler::submit_revision).get(handler::list_revisions),
        )
        .route(
            "/api/orders/{id}/payments",
            post(handler::record_payment).get(handler::list_payments),
        )
        .route(
            "/api/orders/{id}/kitchen-status",
            post(handler::update_kitchen_status),
        )
        .route("/api/orders/{id}/adjustments", get(handler::list_adjustments))
        .route("/api/orders/{id}/ledger/verify", get(handler::verify_ledger))
}
