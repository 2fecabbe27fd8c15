//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::LedgerError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Ledger errors
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // Ledger errors - map to appropriate HTTP status
            AppError::Ledger(ref ledger_err) => match ledger_err {
                LedgerError::Validation { .. } => (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    Some(ledger_err.to_string()),
                ),
                LedgerError::EmptyCommand => (
                    StatusCode::BAD_REQUEST,
                    "empty_command",
                    Some(ledger_err.to_string()),
                ),
                LedgerError::StockTypeNotFound { .. } => (
                    StatusCode::NOT_FOUND,
                    "stock_type_not_found",
                    Some(ledger_err.to_string()),
                ),
                LedgerError::BranchNotFound { .. } => (
                    StatusCode::NOT_FOUND,
                    "branch_not_found",
                    Some(ledger_err.to_string()),
                ),
                LedgerError::MovementNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "movement_not_found",
                    Some(id.to_string()),
                ),
                LedgerError::Internal(msg) => {
                    tracing::error!("Ledger internal error: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
                }
                LedgerError::Database(e) => {
                    tracing::error!("Database error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
            },

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let err = AppError::Ledger(LedgerError::Validation {
            field: "tenant_id",
            message: "must be positive".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::Ledger(LedgerError::BranchNotFound { branch_id: 7 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_maps_to_500() {
        let err = AppError::Internal("boom".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
