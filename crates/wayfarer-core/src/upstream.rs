//! Failure categories reported by external dependencies
//!
//! Each boundary that talks to a third-party library (token verifier,
//! persistence driver) maps that library's errors into one of these
//! categories, so classification never inspects a foreign error shape.

use thiserror::Error;

/// Bearer token verification failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenFailure {
    /// Token is malformed, wrongly signed, or missing required claims
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Token signature is valid but its expiration has passed
    #[error("token expired")]
    Expired,
}

/// Persistence layer failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceFailure {
    /// A unique constraint rejected the write
    #[error("unique constraint violated on {target}")]
    UniqueViolation {
        /// Constraint or column set that rejected the write
        target: String,
    },

    /// The record an operation depends on does not exist
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Any other recognized driver failure
    #[error("database operation failed: {0}")]
    Other(String),
}
