//! Real-time Collaboration Module
//!
//! Connections are grouped into rooms keyed by project id. Pixel edits fan
//! out to the room they belong to; project list changes go to every
//! connection; replies go to the sender only.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports and documentation
//! ├── broadcast.rs - RoomHub: per-room and global broadcast channels
//! ├── session.rs   - Per-connection state and outbound merge
//! ├── dispatch.rs  - ClientMessage handlers
//! └── socket.rs    - WebSocket upgrade and connection loop
//! ```
//!
//! # Delivery
//!
//! - **Room**: one `tokio::sync::broadcast` channel per project
//! - **Global**: one channel shared by every connection
//! - **Reply**: an unbounded mpsc queue owned by the session
//!
//! Leaving is passive: a disconnected session drops its receivers, and the
//! periodic cleanup task in `server::init` removes rooms nobody listens to.

/// Room and global broadcast channels
pub mod broadcast;

/// Per-connection session state
pub mod session;

/// Inbound message dispatcher
pub mod dispatch;

/// WebSocket transport
pub mod socket;

pub use broadcast::RoomHub;
pub use dispatch::dispatch;
pub use session::Session;
pub use socket::handle_socket_upgrade;
