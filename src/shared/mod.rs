//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the realtime layer, the HTTP API and the store. All types are designed
//! for serialization and carry no server-only dependencies.

/// Pixel grid model
pub mod grid;

/// Project data structures
pub mod project;

/// Gallery annotations, sort modes and moderation types
pub mod gallery;

/// Realtime message protocol
pub mod event;

/// Shared error types
pub mod error;

/// Server configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use grid::{check_dimensions, create_grid, Grid, GridError, DEFAULT_COLOR, MAX_GRID_SIDE};
pub use project::{CreateProjectRequest, PixelEdit, Project, ProjectId, ProjectPhase, ProjectSummary, TimerSelector};
pub use gallery::{FlagOutcome, GalleryEntry, RatingRequest, SortMode, FLAG_THRESHOLD};
pub use event::{ClientMessage, ServerMessage};
pub use error::SharedError;
pub use config::{ConfigError, FileConfig, ServerConfig, ServerConfigBuilder};
