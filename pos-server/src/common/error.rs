//! Unified API error handling
//!
//! Maps the revision error taxonomy onto HTTP responses with stable codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::{RevisionError, RevisionErrorCode};
use tracing::error;

/// Unified API response envelope
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Optimistic lock lost the race; the client re-reads and retries
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Kitchen-state or payment-state rule rejected the request
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004", msg.clone()),
            AppError::BusinessRule(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "E0005", msg.clone()),
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9002", "Database error".to_string())
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9001", "Internal server error".to_string())
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });
        (status, body).into_response()
    }
}

impl From<RevisionError> for AppError {
    fn from(err: RevisionError) -> Self {
        let message = err.to_string();
        match err.code() {
            RevisionErrorCode::OrderNotFound
            | RevisionErrorCode::ItemNotFound
            | RevisionErrorCode::CatalogItemNotFound
            | RevisionErrorCode::PaymentNotFound
            | RevisionErrorCode::AdjustmentNotFound => AppError::NotFound(message),
            RevisionErrorCode::OrderVersionMismatch => AppError::Conflict(message),
            RevisionErrorCode::ItemAlreadyCommitted => AppError::BusinessRule(message),
            RevisionErrorCode::InvalidOperation => AppError::Validation(message),
            RevisionErrorCode::StorageError => AppError::Database(message),
            RevisionErrorCode::InternalError => AppError::Internal(message),
        }
    }
}

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}
