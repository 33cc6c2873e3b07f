use std::any::Any;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::{IntoResponse, Response};
use http::Method;
use wayfarer_core::{
    ApiError, AppError, Classified, ErrorKind, PersistenceFailure, TokenFailure, ValidationErrors, classify,
};

/// Result type returned by request handlers
pub type ApiResult<T> = Result<T, HandlerError>;

/// Failure returned from a handler or middleware
///
/// Converting it into a response only classifies it. The envelope
/// middleware renders the body, since it owns the request context.
#[derive(Debug)]
pub struct HandlerError(ApiError);

impl HandlerError {
    /// No route serves this method and path
    pub(crate) fn route_not_found(method: &Method, path: &str) -> Self {
        AppError::new(ErrorKind::NotFound, format!("Route {method} {path} not found")).into()
    }
}

impl From<ApiError> for HandlerError {
    fn from(error: ApiError) -> Self {
        Self(error)
    }
}

impl From<AppError> for HandlerError {
    fn from(error: AppError) -> Self {
        Self(error.into())
    }
}

impl From<ValidationErrors> for HandlerError {
    fn from(error: ValidationErrors) -> Self {
        Self(error.into())
    }
}

impl From<TokenFailure> for HandlerError {
    fn from(error: TokenFailure) -> Self {
        Self(error.into())
    }
}

impl From<PersistenceFailure> for HandlerError {
    fn from(error: PersistenceFailure) -> Self {
        Self(error.into())
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(error: anyhow::Error) -> Self {
        Self(error.into())
    }
}

impl From<JsonRejection> for HandlerError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationErrors::single("body", rejection.body_text()).into()
    }
}

impl From<PathRejection> for HandlerError {
    fn from(rejection: PathRejection) -> Self {
        ValidationErrors::single("path", rejection.body_text()).into()
    }
}

/// Classified failure attached to a response for the envelope middleware
#[derive(Debug, Clone)]
pub(crate) struct ErrorReport {
    pub classified: Classified,
    pub trace: String,
}

impl From<&HandlerError> for ErrorReport {
    fn from(error: &HandlerError) -> Self {
        Self {
            classified: classify(&error.0),
            trace: error.0.trace(),
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from(&self);
        let mut response = report.classified.status.into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Turn a caught handler panic into an internal error
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    HandlerError::from(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
