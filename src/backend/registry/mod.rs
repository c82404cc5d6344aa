//! Project Registry
//!
//! The registry holds every active (unfinished) project for the life of the
//! process and is the single source of truth for live editing state. It is
//! built once at startup from the store and then shared through `AppState`
//! as `Arc<RwLock<ProjectRegistry>>`.
//!
//! All grid mutation goes through [`ProjectRegistry::apply_pixel_edit`]. Edits
//! for projects that are no longer here (finished or deleted while a client
//! was still drawing) are logged and ignored so the realtime layer never has
//! to deal with them.
//!
//! A project being finished is detached: it leaves the list while its final
//! grid is written, and is either released once the store confirms or
//! restored at its old position if the write fails.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::store::{ProjectStoreAdapter, StoreError};
use crate::shared::{PixelEdit, Project, ProjectId, ProjectSummary};

/// Registry shared between handlers
pub type SharedRegistry = Arc<RwLock<ProjectRegistry>>;

/// Result of applying a pixel edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelEditOutcome {
    Applied,
    /// No active project with this id; nothing changed
    UnknownProject,
    /// Coordinates outside the grid; nothing changed
    OutOfBounds,
}

/// In-memory collection of active projects
#[derive(Debug, Default, Clone)]
pub struct ProjectRegistry {
    projects: Vec<Project>,
    finishing: HashSet<ProjectId>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_projects(projects: Vec<Project>) -> Self {
        Self {
            projects,
            finishing: HashSet::new(),
        }
    }

    /// Bulk load every active project from the store
    pub async fn load(store: &ProjectStoreAdapter) -> Result<Self, StoreError> {
        let projects = store.load_active_projects().await?;
        tracing::info!("[Registry] Loaded {} active project(s) from {}", projects.len(), store.backend_tag());
        Ok(Self::from_projects(projects))
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn find_by_id(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn index_of(&self, id: ProjectId) -> Option<usize> {
        self.projects.iter().position(|p| p.id == id)
    }

    /// Apply one cell change. Never fails; misses are logged.
    pub fn apply_pixel_edit(&mut self, edit: &PixelEdit) -> PixelEditOutcome {
        let Some(project) = self.find_by_id_mut(edit.project_id) else {
            tracing::warn!("[Registry] Pixel edit for unknown project {} ignored", edit.project_id);
            return PixelEditOutcome::UnknownProject;
        };

        match project.grid.set_cell(edit.x, edit.y, edit.color.clone()) {
            Ok(()) => PixelEditOutcome::Applied,
            Err(e) => {
                tracing::warn!("[Registry] Pixel edit for project {} rejected: {}", edit.project_id, e);
                PixelEditOutcome::OutOfBounds
            }
        }
    }

    pub fn add_project(&mut self, project: Project) {
        tracing::debug!("[Registry] Added project {}", project.id);
        self.projects.push(project);
    }

    /// Remove the project at `index`, if any
    pub fn remove_at(&mut self, index: usize) -> Option<Project> {
        if index < self.projects.len() {
            Some(self.projects.remove(index))
        } else {
            None
        }
    }

    pub fn remove_by_id(&mut self, id: ProjectId) -> Option<Project> {
        let index = self.index_of(id)?;
        self.remove_at(index)
    }

    /// Take a project out while its finish is persisted
    pub fn detach(&mut self, id: ProjectId) -> Option<(usize, Project)> {
        let index = self.index_of(id)?;
        let project = self.projects.remove(index);
        self.finishing.insert(id);
        Some((index, project))
    }

    /// Put a detached project back where it was
    pub fn restore(&mut self, index: usize, project: Project) {
        self.finishing.remove(&project.id);
        let index = index.min(self.projects.len());
        self.projects.insert(index, project);
    }

    /// Forget a detached project for good
    pub fn release(&mut self, id: ProjectId) -> bool {
        self.finishing.remove(&id)
    }

    pub fn is_finishing(&self, id: ProjectId) -> bool {
        self.finishing.contains(&id)
    }

    /// Project clients should select after a removal
    pub fn first_id(&self) -> Option<ProjectId> {
        self.projects.first().map(|p| p.id)
    }

    pub fn summaries(&self) -> Vec<ProjectSummary> {
        self.projects.iter().map(Project::summary).collect()
    }
}
