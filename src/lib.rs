//! PixelCollab - Main Library
//!
//! PixelCollab is a backend for collaborative pixel art. Clients join a
//! project room over a WebSocket, paint cells of a shared grid and see each
//! other's edits live. Finished projects move to a gallery where they can be
//! rated and flagged.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by the protocol, the API and the store
//!   - Grid model, projects, gallery annotations
//!   - Realtime client/server messages
//!   - Configuration and error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP and WebSocket server
//!   - Project registry, lifecycle and gallery services
//!   - PostgreSQL or in-memory persistence
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (enables backend modules, on by default)
//!
//! # Usage
//!
//! ```rust,no_run
//! use pixelcollab::backend::server::{create_app, load_config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config()?;
//! let app = create_app(config).await;
//! // Use app with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! All server state is shared through `Arc<RwLock<>>` and
//! `tokio::sync::broadcast` channels; handlers and sessions only hold
//! clones of `AppState`.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
