//! Error types for the bucket ledger
//!
//! Every ledger operation validates before it mutates, so any error returned
//! here means the ledger was left exactly as it was before the call.

use thiserror::Error;

use crate::models::Money;

/// The main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Workspace, bucket or transaction missing
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Operands belong to different workspaces
    #[error("Cross-workspace operation rejected: {0}")]
    CrossWorkspace(String),

    /// Source equals destination, non-positive amount, and similar misuse
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A debit exceeds the funds available in a bucket
    #[error("Insufficient balance in bucket '{bucket}': need {needed}, have {available}")]
    InsufficientBalance {
        bucket: String,
        needed: Money,
        available: Money,
    },

    /// The workspace does not have exactly one inbox. Not recoverable by the user.
    #[error("Inbox invariant violated: {0}")]
    InboxInvariant(String),

    /// Attempt to strip or duplicate the inbox's default status
    #[error("Inbox mutation forbidden: {0}")]
    InboxMutationForbidden(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn workspace_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Workspace",
            identifier: identifier.into(),
        }
    }

    pub fn bucket_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Bucket",
            identifier: identifier.into(),
        }
    }

    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// True for defects in stored data rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InboxInvariant(_) | Self::Storage(_))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = LedgerError::bucket_not_found("Food");
        assert_eq!(err.to_string(), "Bucket not found: Food");
        assert!(err.is_not_found());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_insufficient_balance_error() {
        let err = LedgerError::InsufficientBalance {
            bucket: "Groceries".into(),
            needed: Money::from_cents(60000),
            available: Money::from_cents(20000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance in bucket 'Groceries': need 600.00, have 200.00"
        );
    }

    #[test]
    fn test_inbox_invariant_is_fatal() {
        let err = LedgerError::InboxInvariant("no inbox".into());
        assert!(err.is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LedgerError = io_err.into();
        assert!(matches!(err, LedgerError::Io(_)));
    }
}
