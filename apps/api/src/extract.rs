//! Request extractors that report failures in the API's error format.
//!
//! Axum's own `Json` and `Path` rejections are plain text; these wrappers
//! turn a malformed body into `400 VALIDATION_ERROR` and an unparsable path
//! segment into `404 NOT_FOUND`.
//!
//! Handlers behind authentication take a [`DeferredJson`] so that a bad body
//! never hides a 401/403/404: the parse error is carried into the service and
//! raised only after the caller was authorized.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// JSON request body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

/// A JSON body whose rejection is reported later by the service.
pub type DeferredJson<T> = Result<ApiJson<T>, ApiError>;

impl<T> ApiJson<T> {
    /// The parsed body, or the parse error it was extracted with.
    pub fn deferred(body: DeferredJson<T>) -> ApiResult<T> {
        body.map(|ApiJson(value)| value)
    }
}

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!(detail = %rejection.body_text(), "Rejected request body");
                Err(ApiError::invalid("non_field_errors", rejection_message(&rejection)))
            }
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "Request body contains invalid or unexpected fields.",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON.",
        JsonRejection::MissingJsonContentType(_) => "Expected request with `Content-Type: application/json`.",
        _ => "Request body could not be read.",
    }
}

/// Typed path parameters.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(_) => Err(ApiError::NotFound(format!("No resource at {}", parts.uri.path()))),
        }
    }
}
