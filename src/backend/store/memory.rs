/**
 * In-Memory Store Backend
 *
 * Keeps the four tables (projects, permission grants, ratings, flags) in
 * process behind one `tokio::sync::Mutex`. Used when no database URL is
 * configured and by the test suites.
 *
 * Semantics follow `PgStore`: ids are assigned in insert order, new projects
 * start with empty grid text, deletes cascade to grants, ratings and flags,
 * and a repeated flag is reported as `AlreadyExists`.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{NewProjectRow, ProjectRow, StoreBackend, StoreError};
use crate::shared::{FlagOutcome, ProjectId};

#[derive(Default)]
struct Tables {
    next_id: ProjectId,
    projects: BTreeMap<ProjectId, ProjectRow>,
    permissions: HashSet<(Uuid, ProjectId)>,
    ratings: HashMap<(ProjectId, Uuid), i32>,
    flags: HashSet<(ProjectId, Uuid)>,
}

/// Store backend kept entirely in process memory.
///
/// Ids are assigned from 1 upwards. Failure switches let tests exercise the
/// paths where the store is unreachable.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    fail_permission_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every project write fail until switched off
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make permission inserts fail until switched off
    pub fn set_fail_permission_inserts(&self, fail: bool) {
        self.fail_permission_inserts.store(fail, Ordering::SeqCst);
    }

    /// Put a row in place as-is, e.g. one with legacy grid text
    pub async fn insert_raw(&self, row: ProjectRow) {
        let mut tables = self.tables.lock().await;
        tables.next_id = tables.next_id.max(row.project_id);
        tables.projects.insert(row.project_id, row);
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn fetch_projects(&self, finished: bool) -> Result<Vec<ProjectRow>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .projects
            .values()
            .filter(|row| row.is_finished == finished)
            .cloned()
            .collect())
    }

    async fn fetch_project(&self, id: ProjectId) -> Result<Option<ProjectRow>, StoreError> {
        Ok(self.tables.lock().await.projects.get(&id).cloned())
    }

    async fn insert_project(&self, row: NewProjectRow) -> Result<ProjectId, StoreError> {
        self.check_writes()?;
        let mut tables = self.tables.lock().await;
        tables.next_id += 1;
        let id = tables.next_id;
        tables.projects.insert(
            id,
            ProjectRow {
                project_id: id,
                owner_id: row.owner_id,
                project_owner: row.project_owner,
                project_name: row.project_name,
                xsize: row.xsize,
                ysize: row.ysize,
                grid: String::new(),
                is_finished: false,
                started_at: Some(row.started_at),
                finished_at: row.finished_at,
                is_public: false,
                timer: row.timer,
            },
        );
        Ok(id)
    }

    async fn update_grid(&self, id: ProjectId, grid: &str, xsize: i64, ysize: i64) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut tables = self.tables.lock().await;
        let row = tables.projects.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        row.grid = grid.to_string();
        row.xsize = xsize;
        row.ysize = ysize;
        Ok(())
    }

    async fn mark_finished(&self, id: ProjectId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut tables = self.tables.lock().await;
        let row = tables.projects.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        row.is_finished = true;
        row.finished_at = Some(at);
        Ok(())
    }

    async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError> {
        self.check_writes()?;
        let mut tables = self.tables.lock().await;
        let removed = tables.projects.remove(&id).is_some();
        if removed {
            tables.permissions.retain(|(_, project_id)| *project_id != id);
            tables.ratings.retain(|(project_id, _), _| *project_id != id);
            tables.flags.retain(|(project_id, _)| *project_id != id);
        }
        Ok(removed)
    }

    async fn set_public(&self, id: ProjectId, value: bool) -> Result<bool, StoreError> {
        self.check_writes()?;
        let mut tables = self.tables.lock().await;
        let row = tables.projects.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        row.is_public = value;
        Ok(row.is_public)
    }

    async fn insert_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<(), StoreError> {
        if self.fail_permission_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("permission writes disabled".to_string()));
        }
        let mut tables = self.tables.lock().await;
        if !tables.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound(project_id));
        }
        tables.permissions.insert((user_id, project_id));
        Ok(())
    }

    async fn delete_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.permissions.remove(&(user_id, project_id)))
    }

    async fn has_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.permissions.contains(&(user_id, project_id)))
    }

    async fn permitted_project_ids(&self, user_id: Uuid) -> Result<Vec<ProjectId>, StoreError> {
        let tables = self.tables.lock().await;
        let mut ids: Vec<ProjectId> = tables
            .permissions
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, project_id)| *project_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn projects_without_permissions(&self) -> Result<Vec<ProjectId>, StoreError> {
        let tables = self.tables.lock().await;
        let granted: HashSet<ProjectId> = tables.permissions.iter().map(|(_, id)| *id).collect();
        Ok(tables
            .projects
            .keys()
            .copied()
            .filter(|id| !granted.contains(id))
            .collect())
    }

    async fn upsert_rating(&self, project_id: ProjectId, rater_id: Uuid, score: i32) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound(project_id));
        }
        tables.ratings.insert((project_id, rater_id), score);
        Ok(())
    }

    async fn delete_rating(&self, project_id: ProjectId, rater_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .ratings
            .remove(&(project_id, rater_id))
            .is_some())
    }

    async fn average_rating(&self, project_id: ProjectId) -> Result<Option<f64>, StoreError> {
        let tables = self.tables.lock().await;
        let scores: Vec<i32> = tables
            .ratings
            .iter()
            .filter(|((id, _), _)| *id == project_id)
            .map(|(_, score)| *score)
            .collect();
        if scores.is_empty() {
            return Ok(None);
        }
        let total: i64 = scores.iter().map(|s| i64::from(*s)).sum();
        Ok(Some(total as f64 / scores.len() as f64))
    }

    async fn insert_flag(&self, project_id: ProjectId, flagger_id: Uuid) -> Result<FlagOutcome, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound(project_id));
        }
        if tables.flags.insert((project_id, flagger_id)) {
            Ok(FlagOutcome::Created)
        } else {
            Ok(FlagOutcome::AlreadyExists)
        }
    }

    async fn flag_count(&self, project_id: ProjectId) -> Result<u64, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.flags.iter().filter(|(id, _)| *id == project_id).count() as u64)
    }
}
