//! Error types for the Coderr API.
//!
//! ## Status Mapping
//! ```text
//! ApiError::Unauthenticated          → 401 UNAUTHENTICATED
//! ApiError::PermissionDenied(Role…)  → 403 ROLE_MISMATCH
//! ApiError::PermissionDenied(other)  → 403 FORBIDDEN
//! ApiError::Validation               → 400 VALIDATION_ERROR (+ fields)
//! ApiError::NotFound                 → 404 NOT_FOUND
//! ApiError::Conflict                 → 409 CONFLICT
//! ApiError::Database                 → 500 DATABASE_ERROR
//! ApiError::Internal                 → 500 INTERNAL
//! ```
//! Database and internal details are logged, never sent to the client.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use coderr_core::policy::DenyReason;
use coderr_core::{CoreError, ValidationError, ValidationErrors};
use coderr_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(DenyReason),

    #[error("Invalid request: {0}")]
    Validation(ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for service operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// A single-field validation error.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(ValidationError::invalid(field, message).into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::PermissionDenied(reason) => reason.code(),
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Unauthenticated => {
                ApiError::Unauthenticated(DenyReason::Unauthenticated.to_string())
            }
            CoreError::PermissionDenied { reason } => ApiError::PermissionDenied(reason),
            CoreError::Validation(errors) => ApiError::Validation(errors),
            not_found @ CoreError::NotFound { .. } => ApiError::NotFound(not_found.to_string()),
            CoreError::Conflict { message } => ApiError::Conflict(message),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::Validation(error.into())
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { entity, id } => ApiError::NotFound(format!("{entity} not found: {id}")),
            DbError::UniqueViolation { field } => {
                ApiError::Conflict(format!("A record with this {field} already exists."))
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, fields) = match &self {
            ApiError::Unauthenticated(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => {
                (msg.clone(), None)
            }
            ApiError::PermissionDenied(reason) => (reason.to_string(), None),
            ApiError::Validation(errors) => {
                ("Invalid input.".to_string(), Some(errors.to_field_map()))
            }
            ApiError::Database(detail) | ApiError::Internal(detail) => {
                error!(code, %detail, "Request failed");
                ("Internal server error.".to_string(), None)
            }
        };

        (status, Json(ErrorBody { code, message, fields })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderr_core::ProfileKind;

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::Unauthenticated.into();
        assert_eq!((err.status(), err.code()), (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"));

        let err: ApiError = CoreError::PermissionDenied {
            reason: DenyReason::RoleMismatch {
                required: ProfileKind::Business,
            },
        }
        .into();
        assert_eq!((err.status(), err.code()), (StatusCode::FORBIDDEN, "ROLE_MISMATCH"));

        let err: ApiError = CoreError::PermissionDenied {
            reason: DenyReason::NotCounterparty,
        }
        .into();
        assert_eq!((err.status(), err.code()), (StatusCode::FORBIDDEN, "FORBIDDEN"));

        let err: ApiError = CoreError::not_found("Offer", 7).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = CoreError::conflict("dup").into();
        assert_eq!((err.status(), err.code()), (StatusCode::CONFLICT, "CONFLICT"));
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::UniqueViolation {
            field: "users.username".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::QueryFailed("syntax".to_string()).into();
        assert_eq!((err.status(), err.code()), (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"));
    }

    #[test]
    fn test_validation_has_400() {
        let err = ApiError::invalid("status", "bad");
        assert_eq!((err.status(), err.code()), (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_validation_body_lists_messages_by_field() {
        let response = ApiError::invalid("status", "Not a valid status.").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["fields"]["status"], serde_json::json!(["Not a valid status."]));
    }
}
