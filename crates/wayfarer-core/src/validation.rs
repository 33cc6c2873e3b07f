//! Structured input validation
//!
//! Handlers run their checks through a [`Validator`] and get back every
//! failing field at once instead of stopping at the first problem.

use serde::Serialize;
use thiserror::Error;

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field path as the client sent it (e.g. `numberOfPeople`)
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

/// One or more field validation failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("validation failed for {} field(s)", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Build from a single failure
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Field errors as a JSON payload for envelope details
    pub fn to_details(&self) -> serde_json::Value {
        serde_json::json!({ "fields": self.errors })
    }
}

/// Accumulates field checks
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field` unless `ok` holds
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field: field.to_owned(),
                message: message.into(),
            });
        }
        self
    }

    /// Require a string to contain something other than whitespace
    pub fn non_blank(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "must not be empty")
    }

    /// Finish validation
    ///
    /// # Errors
    ///
    /// Returns every recorded failure if any check failed
    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }
}
