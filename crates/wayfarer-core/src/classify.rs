use std::fmt::Write as _;

use http::StatusCode;
use thiserror::Error;

use crate::error::{AppError, ErrorCode, HttpError};
use crate::upstream::{PersistenceFailure, TokenFailure};
use crate::validation::ValidationErrors;

/// Any failure that can reach the response boundary
///
/// Request handlers return `Result<T, ApiError>`. Explicit application
/// errors and each upstream failure category get their own variant;
/// everything else is `Internal`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Explicitly raised application error
    #[error(transparent)]
    App(#[from] AppError),

    /// Bearer token verification failed
    #[error(transparent)]
    Token(#[from] TokenFailure),

    /// Structured input validation failed
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Persistence layer failure
    #[error(transparent)]
    Persistence(#[from] PersistenceFailure),

    /// Unexpected failure
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Outcome of classifying an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
    /// Structured payload, exposed only in development mode
    pub details: Option<serde_json::Value>,
}

/// Map an error to its status, machine code and client-safe message
///
/// Total and deterministic: every error yields exactly one outcome.
pub fn classify(error: &ApiError) -> Classified {
    let (status, code, message, details) = match error {
        ApiError::App(app) => (
            app.status_code(),
            app.error_code(),
            app.client_message(),
            app.details().cloned(),
        ),
        ApiError::Token(TokenFailure::Invalid(_)) => (
            StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken,
            "Invalid token".to_owned(),
            None,
        ),
        ApiError::Token(TokenFailure::Expired) => (
            StatusCode::UNAUTHORIZED,
            ErrorCode::TokenExpired,
            "Token expired".to_owned(),
            None,
        ),
        ApiError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationError,
            "Validation failed".to_owned(),
            Some(errors.to_details()),
        ),
        ApiError::Persistence(PersistenceFailure::UniqueViolation { target }) => (
            StatusCode::CONFLICT,
            ErrorCode::UniqueConstraintError,
            "Resource already exists".to_owned(),
            Some(serde_json::json!({ "target": target })),
        ),
        ApiError::Persistence(PersistenceFailure::RecordNotFound(_)) => (
            StatusCode::NOT_FOUND,
            ErrorCode::RecordNotFound,
            "Record not found".to_owned(),
            None,
        ),
        ApiError::Persistence(PersistenceFailure::Other(_)) => (
            StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseError,
            "Database operation failed".to_owned(),
            None,
        ),
        ApiError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            "Internal server error".to_owned(),
            None,
        ),
    };

    Classified {
        status,
        code,
        message,
        details,
    }
}

impl ApiError {
    /// Diagnostic trace for development-mode logs and envelopes
    ///
    /// Renders the error followed by its source chain. Unexpected errors
    /// use `anyhow`'s debug form, which includes a backtrace when one was
    /// captured.
    pub fn trace(&self) -> String {
        if let Self::Internal(inner) = self {
            return format!("{inner:?}");
        }

        let mut trace = format!("{}: {self}", classify(self).code);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let _ = write!(trace, "\n  caused by: {cause}");
            source = cause.source();
        }
        trace
    }
}

impl HttpError for ApiError {
    fn status_code(&self) -> StatusCode {
        classify(self).status
    }

    fn error_code(&self) -> ErrorCode {
        classify(self).code
    }

    fn client_message(&self) -> String {
        classify(self).message
    }
}
