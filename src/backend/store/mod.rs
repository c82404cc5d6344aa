//! Project Store Module
//!
//! This module bridges the in-memory project representation and durable
//! storage. It is split in two layers:
//!
//! - **`StoreBackend`** - keyed row-level CRUD over projects, permission
//!   grants, ratings and flags. Implemented by `PgStore` (PostgreSQL via sqlx)
//!   and `MemoryStore` (in-process, used by tests and when no database is
//!   configured).
//! - **`ProjectStoreAdapter`** - turns rows into `Project` values and back,
//!   owning the grid text encoding and the two-step project creation.
//!
//! # Module Structure
//!
//! ```text
//! store/
//! ├── mod.rs      - Backend trait, rows and errors
//! ├── adapter.rs  - Row <-> Project translation
//! ├── memory.rs   - In-memory backend
//! └── postgres.rs - PostgreSQL backend
//! ```
//!
//! # Consistency
//!
//! The backend trait offers no transactions. Project creation writes the
//! project row and then the owner's permission grant; a failure in the second
//! write leaves a project without any grant. `ProjectStoreAdapter::
//! audit_orphaned_projects` lists such projects so they can be re-granted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::{FlagOutcome, GridError, ProjectId};

/// Row to project translation
pub mod adapter;

/// In-memory backend
pub mod memory;

/// PostgreSQL backend
pub mod postgres;

pub use adapter::ProjectStoreAdapter;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by store backends and the adapter
#[derive(Debug, Error)]
pub enum StoreError {
    /// No project with this id exists
    #[error("project {0} not found")]
    NotFound(ProjectId),

    /// The database rejected or failed a query
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored grid text could not be decoded, or a grid could not be encoded
    #[error("corrupt grid for project {id}: {source}")]
    Corrupt {
        id: ProjectId,
        #[source]
        source: GridError,
    },

    /// A project was asked for with a size no grid may have
    #[error("invalid project size: {0}")]
    InvalidDimensions(#[source] GridError),

    /// The backend could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A project as persisted, grid kept as text
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProjectRow {
    pub project_id: ProjectId,
    pub owner_id: Uuid,
    pub project_owner: String,
    pub project_name: String,
    pub xsize: i64,
    pub ysize: i64,
    /// JSON array of rows, or an empty string when never initialized
    pub grid: String,
    pub is_finished: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub is_public: bool,
    pub timer: String,
}

/// Values for a project insert; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewProjectRow {
    pub owner_id: Uuid,
    pub project_owner: String,
    pub project_name: String,
    pub xsize: i64,
    pub ysize: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub timer: String,
}

/// Keyed CRUD over the persistent store
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Short name used in logs
    fn backend_tag(&self) -> &'static str;

    /// All projects with the given finished flag, oldest id first
    async fn fetch_projects(&self, finished: bool) -> Result<Vec<ProjectRow>, StoreError>;

    async fn fetch_project(&self, id: ProjectId) -> Result<Option<ProjectRow>, StoreError>;

    /// Insert a project with an empty grid and return its id
    async fn insert_project(&self, row: NewProjectRow) -> Result<ProjectId, StoreError>;

    /// Write grid text and dimensions only
    async fn update_grid(&self, id: ProjectId, grid: &str, xsize: i64, ysize: i64) -> Result<(), StoreError>;

    async fn mark_finished(&self, id: ProjectId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Hard delete; returns false when nothing was deleted
    async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError>;

    /// Update the public flag and return the persisted value
    async fn set_public(&self, id: ProjectId, value: bool) -> Result<bool, StoreError>;

    /// Grant `user_id` access to `project_id`; granting twice is a no-op
    async fn insert_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<(), StoreError>;

    async fn delete_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError>;

    async fn has_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError>;

    async fn permitted_project_ids(&self, user_id: Uuid) -> Result<Vec<ProjectId>, StoreError>;

    /// Ids of projects nobody holds a grant for
    async fn projects_without_permissions(&self) -> Result<Vec<ProjectId>, StoreError>;

    /// Insert or overwrite the rating of `rater_id`
    async fn upsert_rating(&self, project_id: ProjectId, rater_id: Uuid, score: i32) -> Result<(), StoreError>;

    async fn delete_rating(&self, project_id: ProjectId, rater_id: Uuid) -> Result<bool, StoreError>;

    async fn average_rating(&self, project_id: ProjectId) -> Result<Option<f64>, StoreError>;

    /// Insert a flag; an existing (project, flagger) pair is left untouched
    async fn insert_flag(&self, project_id: ProjectId, flagger_id: Uuid) -> Result<FlagOutcome, StoreError>;

    async fn flag_count(&self, project_id: ProjectId) -> Result<u64, StoreError>;
}
