//! Shared Error Types
//!
//! This module defines error types that are shared between the realtime layer,
//! the HTTP handlers and the store adapter.
//!
//! # Error Categories
//!
//! - `SerializationError` - a frame or body that is not the expected JSON
//! - `ValidationError` - well-formed input with an unacceptable value
//! - `GridError` - out-of-bounds cells and undecodable grid text
//!
//! # Usage
//!
//! ```rust
//! use pixelcollab::shared::error::SharedError;
//!
//! let error = SharedError::validation("timer", "unknown timer selector");
//! ```
use thiserror::Error;

use crate::shared::grid::GridError;

#[derive(Debug, Error, Clone)]
pub enum SharedError {
    #[error("malformed JSON: {message}")]
    SerializationError { message: String },

    /// `field` names the offending input, e.g. `timer` or `score`
    #[error("invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error(transparent)]
    GridError(#[from] GridError),
}

impl SharedError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
