//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs        - Module exports and documentation
//! ├── router.rs     - Main router creation
//! └── api_routes.rs - Project and gallery API routes
//! ```
//!
//! # Route Types
//!
//! - `GET /ws` - WebSocket realtime protocol
//! - `GET /health` - Liveness probe
//! - `/api/projects/...` - Project lifecycle
//! - `/api/gallery/...` - Gallery listing, ratings and flags

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
