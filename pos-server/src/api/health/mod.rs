//! Health check endpoint

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::core::AppState;

/// Health router
pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
