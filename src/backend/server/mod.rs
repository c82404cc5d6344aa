//! Server Module
//!
//! This module contains the code that assembles the running server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and FromRef implementations
//! ├── config.rs - Configuration loading, database and store selection
//! └── init.rs   - Server initialization and app creation
//! ```
//!
//! # State Management
//!
//! `AppState` is the central state container. It holds the project registry
//! behind `Arc<RwLock<...>>`, the store adapter, the room hub and the
//! identity verifier, plus the lifecycle and gallery services built on them.
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: environment, optional TOML file, defaults
//! 2. **Store Selection**: PostgreSQL if reachable, in-memory otherwise
//! 3. **Registry Load**: every active project is read once at startup
//! 4. **Background Tasks**: periodic cleanup of empty rooms
//! 5. **Router Creation**: HTTP and WebSocket routes

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::load_config;
pub use init::create_app;
pub use state::AppState;
