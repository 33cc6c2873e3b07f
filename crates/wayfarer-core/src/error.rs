use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Trait for errors that can be converted to HTTP error envelopes
///
/// Implemented by the application error types. The server layer turns
/// these into actual HTTP responses, keeping failure vocabulary
/// decoupled from axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Stable machine-readable code (e.g. `NOT_FOUND`)
    fn error_code(&self) -> ErrorCode;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}

/// Machine-readable error codes carried in every error envelope
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::IntoStaticStr, strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    RateLimited,
    InvalidToken,
    TokenExpired,
    UniqueConstraintError,
    RecordNotFound,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// Wire form of the code
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Failure kinds that request handlers raise explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    RateLimited,
    Internal,
}

impl ErrorKind {
    /// Default HTTP status for this kind
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine code for this kind
    pub const fn code(self) -> ErrorCode {
        match self {
            Self::Validation => ErrorCode::ValidationError,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::Forbidden => ErrorCode::Forbidden,
            Self::NotFound => ErrorCode::NotFound,
            Self::Conflict => ErrorCode::Conflict,
            Self::RateLimited => ErrorCode::RateLimited,
            Self::Internal => ErrorCode::InternalError,
        }
    }
}

/// An explicitly raised application failure
///
/// Carries its own status and machine code through `kind`. Handlers
/// return these instead of ad-hoc errors; the classifier passes them
/// through unchanged.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    details: Option<serde_json::Value>,
}

impl AppError {
    /// Raise an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Attach a structured payload, exposed only in development mode
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        let error = Self::new(ErrorKind::Validation, message);
        match details {
            Some(details) => error.with_details(details),
            None => error,
        }
    }

    /// `<resource> not found`
    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{resource} not found"))
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "Unauthorized")
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Forbidden, "Forbidden")
    }

    pub fn conflict() -> Self {
        Self::new(ErrorKind::Conflict, "Resource already exists")
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal, "Internal server error")
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }
}

impl HttpError for AppError {
    fn status_code(&self) -> StatusCode {
        self.kind.status()
    }

    fn error_code(&self) -> ErrorCode {
        self.kind.code()
    }

    fn client_message(&self) -> String {
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kinds_map_to_default_statuses() {
        let cases = [
            (ErrorKind::Validation, 400, "VALIDATION_ERROR"),
            (ErrorKind::Unauthorized, 401, "UNAUTHORIZED"),
            (ErrorKind::Forbidden, 403, "FORBIDDEN"),
            (ErrorKind::NotFound, 404, "NOT_FOUND"),
            (ErrorKind::Conflict, 409, "CONFLICT"),
            (ErrorKind::RateLimited, 429, "RATE_LIMITED"),
            (ErrorKind::Internal, 500, "INTERNAL_ERROR"),
        ];

        for (kind, status, code) in cases {
            assert_eq!(kind.status().as_u16(), status, "{kind:?}");
            assert_eq!(kind.code().as_str(), code, "{kind:?}");
        }
    }

    #[test]
    fn codes_serialize_like_display() {
        for code in ErrorCode::iter() {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, serde_json::Value::String(code.to_string()));
        }
    }

    #[test]
    fn helper_constructors_use_default_messages() {
        assert_eq!(AppError::not_found("Trip").message(), "Trip not found");
        assert_eq!(AppError::unauthorized().message(), "Unauthorized");
        assert_eq!(AppError::forbidden().message(), "Forbidden");
        assert_eq!(AppError::conflict().message(), "Resource already exists");
        assert_eq!(AppError::internal().message(), "Internal server error");
        assert_eq!(AppError::conflict().kind(), ErrorKind::Conflict);
    }

    #[test]
    fn validation_helper_keeps_details() {
        let error = AppError::validation("bad input", Some(serde_json::json!({"field": "budget"})));

        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.details(), Some(&serde_json::json!({"field": "budget"})));
        assert!(AppError::validation("bad input", None).details().is_none());
    }
}
