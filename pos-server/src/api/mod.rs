//! HTTP API - thin axum layer over the revision engine

pub mod health;
pub mod orders;
pub mod payments;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::AppState;

/// Assemble the full API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(payments::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
