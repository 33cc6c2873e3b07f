//! Failure vocabulary and classification for Wayfarer
//!
//! Defines the error taxonomy shared by every request handler and the
//! classifier that maps any failure onto a stable HTTP status and
//! machine-readable code.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod classify;
mod error;
mod upstream;
pub mod validation;

pub use classify::{ApiError, Classified, classify};
pub use error::{AppError, ErrorCode, ErrorKind, HttpError};
pub use upstream::{PersistenceFailure, TokenFailure};
pub use validation::{FieldError, ValidationErrors, Validator};
