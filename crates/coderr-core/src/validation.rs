//! # Validation Module
//!
//! Field validators shared by the catalog, order, review and account rules.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum)                                        │
//! │  └── JSON shape: wrong types, malformed bodies                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: coderr-core                                                  │
//! │  ├── THIS MODULE: per-field rules                                      │
//! │  └── catalog/orders/reviews/accounts: cross-field rules (tier set)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (rating, revisions, price)                      │
//! │  ├── UNIQUE constraints (tier per offer, review per pair)              │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators take the field name as an argument because nested fields are
//! reported under a path such as `details[1].price`.

use crate::error::ValidationError;
use crate::money::{Money, MAX_CENTS};
use crate::{MAX_EMAIL_LEN, MAX_RATING, MAX_TITLE_LEN, MAX_USERNAME_LEN, MIN_RATING};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required, length-limited string and returns it trimmed.
///
/// ## Example
/// ```rust
/// use coderr_core::validation::validate_required;
///
/// assert_eq!(validate_required("title", "  Logo Design ", 255).unwrap(), "Logo Design");
/// assert!(validate_required("title", "   ", 255).is_err());
/// ```
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    validate_max_len(field, value, max)?;
    Ok(value.to_string())
}

/// Validates an optional text field: only the length is checked.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an offer or tier title.
pub fn validate_title(field: &str, title: &str) -> ValidationResult<String> {
    validate_required(field, title, MAX_TITLE_LEN)
}

/// Validates a username.
///
/// ## Rules
/// - Required, at most 150 characters
/// - Letters, digits and `@ . + - _` only
///
/// ## Example
/// ```rust
/// use coderr_core::validation::validate_username;
///
/// assert!(validate_username("max_mustermann").is_ok());
/// assert!(validate_username("max mustermann").is_err());
/// ```
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = validate_required("username", username, MAX_USERNAME_LEN)?;

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(ValidationError::invalid_format(
            "username",
            "may contain only letters, numbers, and @/./+/-/_ characters",
        ));
    }

    Ok(username)
}

/// Validates an email address shape (`local@domain.tld`).
///
/// Deliverability is not checked.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = validate_required("email", email, MAX_EMAIL_LEN)?;

    let invalid = || ValidationError::invalid_format("email", "enter a valid email address");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.rsplit_once('@').ok_or_else(invalid)?;
    if local.is_empty() || local.contains('@') {
        return Err(invalid());
    }
    let valid_domain = domain
        .split('.')
        .collect::<Vec<_>>()
        .as_slice()
        .split_last()
        .is_some_and(|(tld, labels)| {
            !labels.is_empty() && tld.len() >= 2 && labels.iter().all(|l| !l.is_empty())
        });
    if !valid_domain {
        return Err(invalid());
    }

    Ok(email)
}

/// Checks that a password and its confirmation are present and equal.
pub fn validate_passwords(password: &str, repeated: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if password.is_empty() {
        errors.push(ValidationError::required("password"));
    }
    if repeated.is_empty() {
        errors.push(ValidationError::required("repeated_password"));
    }
    if errors.is_empty() && password != repeated {
        errors.push(ValidationError::invalid(
            "repeated_password",
            "Passwords do not match.",
        ));
    }

    errors
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a value that must be at least 1 (revisions, delivery days).
pub fn validate_at_least_one(field: &str, value: i64) -> ValidationResult<()> {
    if value < 1 {
        return Err(ValidationError::AtLeast {
            field: field.to_string(),
            min: 1,
        });
    }

    Ok(())
}

/// Validates a tier price.
///
/// ## Rules
/// - Must be non-negative (free tiers are allowed)
/// - At most ten digits with two decimal places
///
/// ## Example
/// ```rust
/// use coderr_core::money::Money;
/// use coderr_core::validation::validate_price;
///
/// assert!(validate_price("price", Money::from_units(30)).is_ok());
/// assert!(validate_price("price", Money::zero()).is_ok());
/// assert!(validate_price("price", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_CENTS / 100,
        });
    }

    Ok(())
}

/// Validates a review rating (integer 1 to 5).
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: MIN_RATING,
            max: MAX_RATING,
        });
    }

    Ok(())
}

/// Validates a tier feature list; entries are trimmed, empty entries rejected.
pub fn validate_features(field: &str, features: &[String]) -> ValidationResult<Vec<String>> {
    features
        .iter()
        .map(|f| validate_required(field, f, MAX_TITLE_LEN))
        .collect()
}

// =============================================================================
// Query Parameter Validators
// =============================================================================

/// Parses an integer query parameter; blank counts as absent.
pub fn parse_id_param(field: &str, raw: Option<&str>) -> ValidationResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ValidationError::invalid_format(field, "a valid integer is required")),
    }
}

/// Parses a decimal money query parameter; blank counts as absent.
pub fn parse_money_param(field: &str, raw: Option<&str>) -> ValidationResult<Option<Money>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<Money>()
            .map(Some)
            .map_err(|e| ValidationError::invalid_format(field, e.to_string())),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
