//! # Error Types
//!
//! Domain-specific error types for coderr-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  coderr-core errors (this file)                                        │
//! │  ├── CoreError         - The five outcomes every operation can fail    │
//! │  │                       with (401 / 403 / 400 / 404 / 409)            │
//! │  ├── ValidationError   - One field-level input failure                 │
//! │  └── ValidationErrors  - Field-keyed collection of the above           │
//! │                                                                         │
//! │  coderr-db errors (separate crate)                                     │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  HTTP errors (in apps/api)                                             │
//! │  └── ApiError          - What clients see (code + message + fields)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, entity, id)
//! 3. Errors are enum variants, never String
//! 4. Authentication failures never collapse into authorization failures

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::policy::DenyReason;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors.
///
/// Every engine operation either succeeds or fails with exactly one of these.
/// The serving layer maps each variant 1:1 onto an external status.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No (or invalid) credentials.
    ///
    /// Must stay distinct from [`CoreError::PermissionDenied`]: the client
    /// reacts differently (log in again vs. give up).
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthenticated,

    /// Authenticated, but the policy table said no.
    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: DenyReason },

    /// Malformed input (carries a field-keyed message map).
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Referenced entity or cross-reference does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Uniqueness violation (duplicate review, taken username, ...).
    #[error("Conflict: {message}")]
    Conflict { message: String },
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict {
            message: message.into(),
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(ValidationErrors::from(err))
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errs: ValidationErrors) -> Self {
        CoreError::Validation(errs)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Every variant names the offending field so the HTTP layer can build a
/// `{field: [messages]}` map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Numeric value is below its lower bound.
    #[error("{field} must be at least {min}")]
    AtLeast { field: String, min: i64 },

    /// Invalid format (e.g., non-numeric filter, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Rule violation that does not fit the shapes above.
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
}

impl ValidationError {
    /// Name of the field this error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::AtLeast { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Invalid { field, .. } => field,
        }
    }

    /// The message without the field name, as shown under the field's key.
    pub fn message(&self) -> String {
        match self {
            ValidationError::Required { .. } => "This field is required.".to_string(),
            ValidationError::TooLong { max, .. } => {
                format!("Ensure this field has no more than {max} characters.")
            }
            ValidationError::OutOfRange { min, max, .. } => {
                format!("Ensure this value is between {min} and {max}.")
            }
            ValidationError::AtLeast { min, .. } => {
                format!("Ensure this value is greater than or equal to {min}.")
            }
            ValidationError::InvalidFormat { reason, .. } => reason.clone(),
            ValidationError::NotAllowed { allowed, .. } => {
                format!("Must be one of: {}.", allowed.join(", "))
            }
            ValidationError::Invalid { message, .. } => message.clone(),
        }
    }

    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ValidationError::Invalid`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Validation Errors (collection)
// =============================================================================

/// All validation failures found in one request.
///
/// Validators push into this instead of returning on the first failure, so a
/// registration form with three bad fields reports all three.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors(Vec::new())
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    /// Records the error of a `Result`, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            self.push(err);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// True if any error was recorded for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }

    /// Messages grouped by field name.
    pub fn to_field_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for err in &self.0 {
            map.entry(err.field().to_string())
                .or_default()
                .push(err.message());
        }
        map
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors(vec![err])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
