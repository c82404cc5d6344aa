//! Project Routes
//!
//! HTTP access to the project lifecycle. Reads are public; every mutation
//! needs a bearer token, and mutations of an existing project also need a
//! permission grant for it.

/// HTTP handlers for project endpoints
pub mod handlers;

pub use handlers::{
    create_project, delete_project, finish_project, get_project, grant_permission, list_projects,
    revoke_permission, save_project, set_public,
};
