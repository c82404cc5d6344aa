//! Backend Error Module
//!
//! This module defines the error type returned by HTTP handlers and its
//! conversion into HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! # Error Types
//!
//! - `HandlerError` - explicit status raised by a handler
//! - `SharedError` - bad input from the shared module
//! - `Store`, `Lifecycle`, `Gallery` - wrapped domain errors
//!
//! The realtime path does not use `BackendError`; it logs failures and
//! acknowledges them to the sender with `ServerMessage::Error`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
