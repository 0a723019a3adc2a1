//! Payment API module - capture/settle terminal transitions

mod handler;

use axum::{Router, routing::post};

use crate::core::AppState;

/// Payment router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments/{id}/settle", post(handler::settle))
        .route("/api/adjustments/{id}/capture", post(handler::capture))
}
