//! Middleware Module
//!
//! HTTP middleware and extractors that run before handlers.
//!
//! - **`auth`** - bearer token verification for protected routes

pub mod auth;

pub use auth::{auth_middleware, bearer_token, AuthUser};
