/**
 * Backend Error Types
 *
 * This module defines the error type returned by HTTP handlers. Every variant
 * maps to a status code and a message; `conversion` turns it into a JSON
 * response.
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Raised directly by handlers with an explicit status:
 * - Missing or invalid bearer token (401)
 * - Caller lacks a permission grant (403)
 * - Unknown project (404)
 * - Duplicate flag (409)
 *
 * ## Domain Errors
 *
 * Wrapped from the layer that produced them:
 * - `StoreError` - persistence failures
 * - `LifecycleError` - invalid state transitions
 * - `GalleryError` - rating and flag failures
 */

use thiserror::Error;
use axum::http::StatusCode;

use crate::backend::gallery::GalleryError;
use crate::backend::lifecycle::LifecycleError;
use crate::backend::store::StoreError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use pixelcollab::backend::error::BackendError;
///
/// let err = BackendError::not_found("project 4 not found");
/// assert_eq!(err.status_code().as_u16(), 404);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Raised by a handler with an explicit status
    #[error("{message}")]
    HandlerError { status: StatusCode, message: String },

    /// Bad input caught before reaching a service
    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::CONFLICT, message)
    }

    /// Status code sent to the client
    ///
    /// - `HandlerError` - its own status
    /// - `SharedError` - 400 for validation, 500 otherwise
    /// - `Store` - 404 for missing projects, 400 for bad sizes, 503 when
    ///   unreachable, 500 otherwise
    /// - `Lifecycle` / `Gallery` - by variant
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::SharedError(err) => shared_status(err),
            Self::Store(err) => store_status(err),
            Self::Lifecycle(err) => match err {
                LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
                LifecycleError::AlreadyFinished(_) => StatusCode::CONFLICT,
                LifecycleError::IrreversibleTransition { .. } => StatusCode::CONFLICT,
                LifecycleError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                LifecycleError::Validation(err) => shared_status(err),
                LifecycleError::Store(err) => store_status(err),
            },
            Self::Gallery(err) => match err {
                GalleryError::NotInGallery(_) => StatusCode::NOT_FOUND,
                GalleryError::Validation(err) => shared_status(err),
                GalleryError::Store(err) => store_status(err),
            },
        }
    }

    /// Message placed in the `error` field of the response body
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

fn shared_status(err: &SharedError) -> StatusCode {
    match err {
        SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
        SharedError::GridError(_) => StatusCode::BAD_REQUEST,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidDimensions(_) => StatusCode::BAD_REQUEST,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Database(_) | StoreError::Corrupt { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
