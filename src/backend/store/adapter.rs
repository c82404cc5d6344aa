/**
 * Project Store Adapter
 *
 * Translates between `Project` values and `ProjectRow`s. The adapter owns the
 * grid text encoding: grids are written as JSON text and decoded on load, and
 * rows that were never initialized (empty grid text) get a fresh grid of the
 * stored dimensions. Rows whose dimensions exceed `MAX_GRID_SIDE` are
 * reported as corrupt instead of being allocated.
 *
 * # Creation
 *
 * `create_project` checks the size and builds the grid before touching the
 * store. It then performs two writes: the project row, then the owner's
 * permission grant. They are not atomic. If the first write fails nothing else
 * is attempted. If the second fails the error is logged and the project is
 * kept without an owner grant; `audit_orphaned_projects` reports those.
 */

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::{MemoryStore, NewProjectRow, ProjectRow, StoreBackend, StoreError};
use crate::shared::{check_dimensions, create_grid, FlagOutcome, Grid, Project, ProjectId, TimerSelector};

/// Row/Project translation over a `StoreBackend`
#[derive(Clone)]
pub struct ProjectStoreAdapter {
    backend: Arc<dyn StoreBackend>,
}

impl ProjectStoreAdapter {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Adapter over a fresh in-memory backend
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend_tag(&self) -> &'static str {
        self.backend.backend_tag()
    }

    /// All unfinished projects, grids decoded
    pub async fn load_active_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.load_projects(false).await
    }

    /// All finished projects, grids decoded
    pub async fn load_finished_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.load_projects(true).await
    }

    async fn load_projects(&self, finished: bool) -> Result<Vec<Project>, StoreError> {
        let rows = self.backend.fetch_projects(finished).await?;
        let mut projects = Vec::with_capacity(rows.len());
        for row in rows {
            match row_into_project(row) {
                Ok(project) => projects.push(project),
                Err(e) => {
                    tracing::error!("[Store] Skipping unreadable project: {}", e);
                }
            }
        }
        Ok(projects)
    }

    pub async fn load_project_by_id(&self, id: ProjectId) -> Result<Project, StoreError> {
        let row = self
            .backend
            .fetch_project(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        row_into_project(row)
    }

    /// Write the grid and dimensions of `project`.
    ///
    /// On success `project.grid` is replaced by the decode of the text that was
    /// written, so memory and store hold structurally identical grids. On
    /// failure `project` is left untouched.
    pub async fn persist_project_state(&self, project: &mut Project) -> Result<(), StoreError> {
        let text = project.grid.to_json().map_err(|source| StoreError::Corrupt {
            id: project.id,
            source,
        })?;

        self.backend
            .update_grid(project.id, &text, project.xsize, project.ysize)
            .await?;

        project.grid = Grid::from_json(&text).map_err(|source| StoreError::Corrupt {
            id: project.id,
            source,
        })?;
        tracing::debug!("[Store] Persisted grid for project {}", project.id);
        Ok(())
    }

    /// Insert a project and its owner's permission grant.
    ///
    /// `started_at` is now and `finished_at` is now plus the timer duration,
    /// or `None` for an unlimited timer. The returned project carries the
    /// store-assigned id and a freshly initialized grid. Oversized requests
    /// fail with `InvalidDimensions` and write nothing.
    pub async fn create_project(
        &self,
        owner_id: Uuid,
        owner_name: &str,
        name: &str,
        width: i64,
        height: i64,
        timer: TimerSelector,
    ) -> Result<Project, StoreError> {
        check_dimensions(width, height).map_err(StoreError::InvalidDimensions)?;
        let grid = create_grid(width, height);

        let started_at = Utc::now();
        let finished_at = timer.deadline_from(started_at);

        let id = self
            .backend
            .insert_project(NewProjectRow {
                owner_id,
                project_owner: owner_name.to_string(),
                project_name: name.to_string(),
                xsize: width,
                ysize: height,
                started_at,
                finished_at,
                timer: timer.as_str().to_string(),
            })
            .await?;

        if let Err(e) = self.backend.insert_permission(owner_id, id).await {
            tracing::error!(
                "[Store] Project {} created but owner grant for {} failed: {}",
                id,
                owner_id,
                e
            );
        }

        tracing::info!("[Store] Created project {} ({}x{}, timer {})", id, width, height, timer);

        Ok(Project {
            id,
            owner_id,
            owner_name: owner_name.to_string(),
            name: name.to_string(),
            xsize: width,
            ysize: height,
            grid,
            finished: false,
            started_at: Some(started_at),
            finished_at,
            is_public: false,
            timer,
        })
    }

    pub async fn mark_finished(&self, id: ProjectId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.backend.mark_finished(id, at).await
    }

    /// Hard delete; returns false when the project did not exist
    pub async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError> {
        self.backend.delete_project(id).await
    }

    /// Update the public flag and return the persisted value
    pub async fn set_public(&self, id: ProjectId, value: bool) -> Result<bool, StoreError> {
        self.backend.set_public(id, value).await
    }

    pub async fn grant_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<(), StoreError> {
        self.backend.insert_permission(user_id, project_id).await
    }

    pub async fn revoke_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError> {
        self.backend.delete_permission(user_id, project_id).await
    }

    pub async fn has_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError> {
        self.backend.has_permission(user_id, project_id).await
    }

    pub async fn permitted_project_ids(&self, user_id: Uuid) -> Result<HashSet<ProjectId>, StoreError> {
        Ok(self
            .backend
            .permitted_project_ids(user_id)
            .await?
            .into_iter()
            .collect())
    }

    /// Insert or overwrite the caller's rating
    pub async fn rate_project(&self, project_id: ProjectId, rater_id: Uuid, score: i32) -> Result<(), StoreError> {
        self.backend.upsert_rating(project_id, rater_id, score).await
    }

    pub async fn delete_rating(&self, project_id: ProjectId, rater_id: Uuid) -> Result<bool, StoreError> {
        self.backend.delete_rating(project_id, rater_id).await
    }

    pub async fn average_rating(&self, project_id: ProjectId) -> Result<Option<f64>, StoreError> {
        self.backend.average_rating(project_id).await
    }

    pub async fn flag_project(&self, project_id: ProjectId, flagger_id: Uuid) -> Result<FlagOutcome, StoreError> {
        self.backend.insert_flag(project_id, flagger_id).await
    }

    pub async fn flag_count(&self, project_id: ProjectId) -> Result<u64, StoreError> {
        self.backend.flag_count(project_id).await
    }

    /// Projects without any permission grant, left behind by a failed
    /// second write in `create_project`
    pub async fn audit_orphaned_projects(&self) -> Result<Vec<ProjectId>, StoreError> {
        let orphans = self.backend.projects_without_permissions().await?;
        if !orphans.is_empty() {
            tracing::warn!("[Store] {} project(s) have no permission grant: {:?}", orphans.len(), orphans);
        }
        Ok(orphans)
    }
}

/// Decode a row, regenerating never-initialized grids from the dimensions
fn row_into_project(row: ProjectRow) -> Result<Project, StoreError> {
    check_dimensions(row.xsize, row.ysize).map_err(|source| StoreError::Corrupt {
        id: row.project_id,
        source,
    })?;

    let grid = if row.grid.is_empty() {
        create_grid(row.xsize, row.ysize)
    } else {
        Grid::from_json(&row.grid).map_err(|source| StoreError::Corrupt {
            id: row.project_id,
            source,
        })?
    };

    Ok(Project {
        id: row.project_id,
        owner_id: row.owner_id,
        owner_name: row.project_owner,
        name: row.project_name,
        xsize: row.xsize,
        ysize: row.ysize,
        grid,
        finished: row.is_finished,
        started_at: row.started_at,
        finished_at: row.finished_at,
        is_public: row.is_public,
        timer: TimerSelector::parse_lenient(&row.timer),
    })
}
