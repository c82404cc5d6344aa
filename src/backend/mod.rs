//! Backend Module
//!
//! This module contains all server-side code for PixelCollab: the Axum
//! HTTP server, the WebSocket room protocol, the in-memory project
//! registry and the persistence layer behind it.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`realtime`** - Room hub, per-connection sessions, message dispatch
//! - **`registry`** - Authoritative in-memory set of active projects
//! - **`store`** - Project store adapter (PostgreSQL or in-memory)
//! - **`lifecycle`** - Create, save, finish, delete and publish
//! - **`gallery`** - Finished projects, ratings and flags
//! - **`projects`** - HTTP handlers for the project lifecycle
//! - **`auth`** - JWT identity verification
//! - **`middleware`** - Request processing middleware
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── realtime/       - Rooms and WebSocket sessions
//! ├── registry/       - Active project registry
//! ├── store/          - Persistence adapters
//! ├── lifecycle/      - Project lifecycle manager
//! ├── gallery/        - Gallery and moderation
//! ├── projects/       - Project HTTP handlers
//! ├── auth/           - Authentication
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! `AppState` is cloned into every handler. The registry sits behind an
//! `Arc<RwLock<>>`; room channels are `tokio::sync::broadcast` senders
//! keyed by project id. Pixel edits are applied and broadcast while the
//! registry write lock is held, so every room member sees edits in the
//! order they were applied.

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Real-time room system
#[cfg(feature = "ssr")]
pub mod realtime;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Authentication
#[cfg(feature = "ssr")]
pub mod auth;

/// Middleware for request processing
#[cfg(feature = "ssr")]
pub mod middleware;

/// Project persistence
#[cfg(feature = "ssr")]
pub mod store;

/// Active project registry
#[cfg(feature = "ssr")]
pub mod registry;

/// Project lifecycle
#[cfg(feature = "ssr")]
pub mod lifecycle;

/// Gallery and moderation
#[cfg(feature = "ssr")]
pub mod gallery;

/// Project HTTP handlers
#[cfg(feature = "ssr")]
pub mod projects;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use server::{create_app, AppState};
#[cfg(feature = "ssr")]
pub use error::BackendError;
#[cfg(feature = "ssr")]
pub use realtime::RoomHub;
#[cfg(feature = "ssr")]
pub use registry::ProjectRegistry;
#[cfg(feature = "ssr")]
pub use store::{MemoryStore, ProjectStoreAdapter, StoreBackend};
