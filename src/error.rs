//! Custom error types for satbook
//!
//! This module defines the error hierarchy for the engine using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for satbook operations
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

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// A mutating operation was attempted while the store is locked
    #[error("Authentication required: unlock the store before writing")]
    AuthRequired,

    /// The supplied passphrase does not match the stored verification data
    #[error("Invalid passphrase")]
    InvalidPassphrase,

    /// Encryption or key-derivation errors
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// An encrypted payload carries a format version this build cannot read
    #[error("Unsupported encrypted payload version: {0}")]
    UnsupportedVersion(u8),

    /// A price feed could not supply a rate right now
    #[error("Exchange rate unavailable: {0}")]
    RateUnavailable(String),

    /// A backup file failed validation before restore
    #[error("Restore source invalid: {0}")]
    RestoreInvalid(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Create a "not found" error for assets
    pub fn asset_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Asset",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for ledger records
    pub fn record_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Record",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for loans
    pub fn loan_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Loan",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error is transient (worth retrying later)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateUnavailable(_))
    }
}

// Implement From traits for common error types

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

/// Result type alias for satbook operations
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
        let err = LedgerError::asset_not_found("Checking");
        assert_eq!(err.to_string(), "Asset not found: Checking");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_auth_required_display() {
        let err = LedgerError::AuthRequired;
        assert_eq!(
            err.to_string(),
            "Authentication required: unlock the store before writing"
        );
    }

    #[test]
    fn test_rate_unavailable_is_transient() {
        let err = LedgerError::RateUnavailable("feed offline".into());
        assert!(err.is_transient());
        assert!(!LedgerError::AuthRequired.is_transient());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let ledger_err: LedgerError = io_err.into();
        assert!(matches!(ledger_err, LedgerError::Io(_)));
    }
}
