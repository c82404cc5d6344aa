//! Authentication Module
//!
//! Identity is owned by an external service; this server only verifies the
//! bearer tokens it issues. A token resolves to an [`Identity`] holding the
//! user's UUID and display name.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs      - Module exports and documentation
//! └── sessions.rs - JWT claims, verification and the `IdentityVerifier` trait
//! ```
//!
//! Handlers never decode tokens directly. They go through the
//! `Arc<dyn IdentityVerifier>` in `AppState`, either via the
//! `middleware::auth` extractors (HTTP) or explicitly in the realtime
//! dispatcher (`create_project` carries its token in the message).

/// JWT token generation and validation
pub mod sessions;

pub use sessions::{create_token, verify_token, AuthError, Claims, Identity, IdentityVerifier, JwtVerifier};
