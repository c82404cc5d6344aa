//! Project Lifecycle
//!
//! Every project moves through a one-way state machine:
//!
//! ```text
//! Active --finish--> Finished
//! ```
//!
//! Public visibility is a separate flag that can be switched on once and never
//! off again. Timers only set an informational deadline at creation; nothing
//! finishes a project automatically when it passes.
//!
//! `LifecycleManager` is the only place that moves projects in and out of the
//! registry. The registry lock is only taken for in-memory steps and is never
//! held across a store call, so a slow store delays the request that needs it
//! and nothing else. Saves write a snapshot of the grid; edits made while the
//! write is in flight stay in memory for the next save. A project being
//! finished is detached from the registry until its final grid is stored, so
//! late edits for it are ignored rather than lost.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::backend::auth::{AuthError, Identity, IdentityVerifier};
use crate::backend::registry::SharedRegistry;
use crate::backend::store::{ProjectStoreAdapter, StoreError};
use crate::shared::{check_dimensions, CreateProjectRequest, Project, ProjectId, SharedError, TimerSelector};

/// Lifecycle failures
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("project {0} not found")]
    NotFound(ProjectId),

    /// The project already reached the Finished state
    #[error("project {0} is already finished")]
    AlreadyFinished(ProjectId),

    /// A one-way flag was asked to go back
    #[error("project {id}: {message}")]
    IrreversibleTransition { id: ProjectId, message: String },

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] SharedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LifecycleError {
    /// Short machine-readable code sent to realtime clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyFinished(_) => "already_finished",
            Self::IrreversibleTransition { .. } => "irreversible",
            Self::Unauthorized(_) => "unauthorized",
            Self::Validation(_) => "invalid",
            Self::Store(StoreError::NotFound(_)) => "not_found",
            Self::Store(StoreError::InvalidDimensions(_)) => "invalid",
            Self::Store(_) => "store_failure",
        }
    }

    /// True when the failure happened after in-memory or durable state may
    /// have been touched
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::Store(e) if !matches!(e, StoreError::NotFound(_) | StoreError::InvalidDimensions(_))
        )
    }
}

/// A finished project and the project clients should select next
#[derive(Debug, Clone, PartialEq)]
pub struct FinishOutcome {
    pub project: Project,
    pub next_current: Option<ProjectId>,
}

/// Creates, saves, finishes, deletes and publishes projects
#[derive(Clone)]
pub struct LifecycleManager {
    registry: SharedRegistry,
    store: ProjectStoreAdapter,
    verifier: Arc<dyn IdentityVerifier>,
    lenient_timers: bool,
}

impl LifecycleManager {
    pub fn new(
        registry: SharedRegistry,
        store: ProjectStoreAdapter,
        verifier: Arc<dyn IdentityVerifier>,
        lenient_timers: bool,
    ) -> Self {
        Self {
            registry,
            store,
            verifier,
            lenient_timers,
        }
    }

    /// Verify `token` and create a project owned by its holder
    pub async fn create_project(
        &self,
        token: &str,
        request: &CreateProjectRequest,
    ) -> Result<Project, LifecycleError> {
        let identity = self.verifier.verify(token).map_err(|e| {
            tracing::warn!("[Lifecycle] Rejected project creation: {}", e);
            LifecycleError::from(e)
        })?;
        self.create_project_for(&identity, request).await
    }

    /// Create a project for an already verified caller.
    ///
    /// Sizes above `MAX_GRID_SIDE` are rejected before anything is written.
    /// The project is written to the store first and only added to the
    /// registry once it has an id.
    pub async fn create_project_for(
        &self,
        identity: &Identity,
        request: &CreateProjectRequest,
    ) -> Result<Project, LifecycleError> {
        let timer = TimerSelector::resolve(&request.timer, self.lenient_timers)?;
        check_dimensions(request.xsize, request.ysize).map_err(|e| {
            tracing::warn!("[Lifecycle] Rejected project size from {}: {}", identity.name, e);
            SharedError::validation("size", e.to_string())
        })?;
        let name = request.name.trim();

        let project = self
            .store
            .create_project(
                identity.user_id,
                &identity.name,
                name,
                request.xsize,
                request.ysize,
                timer,
            )
            .await
            .map_err(|e| {
                tracing::error!("[Lifecycle] Failed to create project '{}': {}", name, e);
                e
            })?;
        self.registry.write().await.add_project(project.clone());

        tracing::info!(
            "[Lifecycle] {} created project {} '{}'",
            identity.name,
            project.id,
            project.name
        );
        Ok(project)
    }

    /// Write the live grid of an active project to the store
    pub async fn save_project(&self, id: ProjectId) -> Result<(), LifecycleError> {
        let mut snapshot = self.snapshot(id).await?;
        let written = snapshot.grid.clone();

        self.store.persist_project_state(&mut snapshot).await.map_err(|e| {
            tracing::error!("[Lifecycle] Failed to save project {}: {}", id, e);
            e
        })?;

        let mut registry = self.registry.write().await;
        if let Some(project) = registry.find_by_id_mut(id) {
            // Edits that arrived during the write win over the decoded copy
            if project.grid == written {
                project.grid = snapshot.grid;
            }
        }
        tracing::debug!("[Lifecycle] Saved project {}", id);
        Ok(())
    }

    /// Persist the final grid, mark the project finished and drop it from the
    /// registry.
    ///
    /// If either store write fails the project stays active in memory.
    pub async fn finish_project(&self, id: ProjectId) -> Result<FinishOutcome, LifecycleError> {
        // Spawned so a dropped caller cannot leave the project detached
        let manager = self.clone();
        tokio::spawn(async move { manager.finish_detached(id).await })
            .await
            .map_err(|e| {
                tracing::error!("[Lifecycle] Finish of project {} did not complete: {}", id, e);
                LifecycleError::Store(StoreError::Unavailable(format!("finish of project {id} did not complete")))
            })?
    }

    async fn finish_detached(&self, id: ProjectId) -> Result<FinishOutcome, LifecycleError> {
        let (index, mut project) = self
            .registry
            .write()
            .await
            .detach(id)
            .ok_or(LifecycleError::NotFound(id))?;

        let finished_at = Utc::now();
        let stored = self.store_final_state(&mut project, finished_at).await;

        let mut registry = self.registry.write().await;
        if let Err(e) = stored {
            registry.restore(index, project);
            return Err(e.into());
        }
        registry.release(id);

        project.finished = true;
        project.finished_at = Some(finished_at);
        let next_current = registry.first_id();
        tracing::info!("[Lifecycle] Project {} finished", id);
        Ok(FinishOutcome { project, next_current })
    }

    async fn store_final_state(&self, project: &mut Project, finished_at: DateTime<Utc>) -> Result<(), StoreError> {
        let id = project.id;
        self.store.persist_project_state(project).await.map_err(|e| {
            tracing::error!("[Lifecycle] Failed to persist final grid of project {}: {}", id, e);
            e
        })?;
        self.store.mark_finished(id, finished_at).await.map_err(|e| {
            tracing::error!("[Lifecycle] Failed to mark project {} finished: {}", id, e);
            e
        })
    }

    /// Hard delete a project that never finished.
    ///
    /// Returns the project clients should select next.
    pub async fn delete_project(&self, id: ProjectId) -> Result<Option<ProjectId>, LifecycleError> {
        let (active, finishing) = {
            let registry = self.registry.read().await;
            (registry.index_of(id).is_some(), registry.is_finishing(id))
        };

        if finishing {
            return Err(LifecycleError::AlreadyFinished(id));
        }

        if !active {
            match self.store.load_project_by_id(id).await {
                Ok(project) if project.finished => return Err(LifecycleError::AlreadyFinished(id)),
                Ok(_) => {
                    // In the store but never loaded, e.g. skipped as unreadable
                    self.store.delete_project(id).await?;
                    tracing::info!("[Lifecycle] Deleted unloaded project {}", id);
                    return Ok(self.registry.read().await.first_id());
                }
                Err(StoreError::NotFound(_)) => return Err(LifecycleError::NotFound(id)),
                Err(e) => return Err(e.into()),
            }
        }

        let existed = self.store.delete_project(id).await.map_err(|e| {
            tracing::error!("[Lifecycle] Failed to delete project {}: {}", id, e);
            e
        })?;
        if !existed {
            tracing::warn!("[Lifecycle] Project {} was missing from the store", id);
        }

        let mut registry = self.registry.write().await;
        registry.remove_by_id(id);
        tracing::info!("[Lifecycle] Deleted project {}", id);
        Ok(registry.first_id())
    }

    /// Set the public flag. Once public a project stays public.
    pub async fn set_public(&self, id: ProjectId, value: bool) -> Result<bool, LifecycleError> {
        let live = self.registry.read().await.find_by_id(id).map(|p| p.is_public);
        let current = match live {
            Some(is_public) => is_public,
            None => match self.store.load_project_by_id(id).await {
                Ok(project) => project.is_public,
                Err(StoreError::NotFound(_)) => return Err(LifecycleError::NotFound(id)),
                Err(e) => return Err(e.into()),
            },
        };

        if current && !value {
            return Err(LifecycleError::IrreversibleTransition {
                id,
                message: "a public project cannot be made private".to_string(),
            });
        }
        if current == value {
            return Ok(current);
        }

        let stored = self.store.set_public(id, value).await?;
        let mut registry = self.registry.write().await;
        if let Some(project) = registry.find_by_id_mut(id) {
            project.is_public = stored;
        }
        tracing::info!("[Lifecycle] Project {} is now public", id);
        Ok(stored)
    }

    async fn snapshot(&self, id: ProjectId) -> Result<Project, LifecycleError> {
        self.registry
            .read()
            .await
            .find_by_id(id)
            .cloned()
            .ok_or(LifecycleError::NotFound(id))
    }
}
