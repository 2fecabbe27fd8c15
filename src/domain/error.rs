//! Ledger error taxonomy
//!
//! Small closed set of failure kinds a caller of the engine can observe.
//! Validation and not-found errors surface before any persistence; an
//! idempotent replay is not an error at all.

/// Errors produced by the ledger engine and its stores.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Bad or missing input, named by field.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Every impact rounded to a zero delta.
    #[error("No-op command rejected: no impact with a non-zero delta")]
    EmptyCommand,

    /// Stock type is missing, inactive, or outside the impact's scope.
    #[error("Stock type {stock_type_id} not found in scope group {scope_group_id}")]
    StockTypeNotFound {
        stock_type_id: i64,
        scope_group_id: i64,
    },

    /// Branch does not exist for the tenant.
    #[error("Branch {branch_id} not found")]
    BranchNotFound { branch_id: i64 },

    /// Movement lookup by id came back empty.
    #[error("Movement not found: {0}")]
    MovementNotFound(uuid::Uuid),

    /// The fallback re-read after a create conflict found nothing. Fatal.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_names_field() {
        let err = LedgerError::validation("tenant_id", "must be positive");
        assert_eq!(err.to_string(), "Invalid tenant_id: must be positive");
    }

    #[test]
    fn test_not_found_messages() {
        let err = LedgerError::StockTypeNotFound {
            stock_type_id: 10,
            scope_group_id: 100,
        };
        assert!(err.to_string().contains("Stock type 10"));

        let err = LedgerError::BranchNotFound { branch_id: 7 };
        assert!(err.to_string().contains("Branch 7"));
    }
}
