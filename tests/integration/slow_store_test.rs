//! Store latency integration tests
//!
//! `GatedStore` parks every grid write until the test releases it, so the
//! tests can act while a save or finish is still waiting on the store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pixelcollab::backend::realtime::{dispatch, Session};
use pixelcollab::backend::server::AppState;
use pixelcollab::backend::store::{MemoryStore, NewProjectRow, ProjectRow, ProjectStoreAdapter, StoreBackend, StoreError};
use pixelcollab::shared::{ClientMessage, FlagOutcome, PixelEdit, ProjectId, ServerMessage};
use tokio::sync::Notify;
use tokio::time::timeout;
use uuid::Uuid;

use crate::common::*;

#[derive(Default)]
struct GatedStore {
    inner: MemoryStore,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl StoreBackend for GatedStore {
    fn backend_tag(&self) -> &'static str {
        "gated"
    }

    async fn fetch_projects(&self, finished: bool) -> Result<Vec<ProjectRow>, StoreError> {
        self.inner.fetch_projects(finished).await
    }

    async fn fetch_project(&self, id: ProjectId) -> Result<Option<ProjectRow>, StoreError> {
        self.inner.fetch_project(id).await
    }

    async fn insert_project(&self, row: NewProjectRow) -> Result<ProjectId, StoreError> {
        self.inner.insert_project(row).await
    }

    async fn update_grid(&self, id: ProjectId, grid: &str, xsize: i64, ysize: i64) -> Result<(), StoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.update_grid(id, grid, xsize, ysize).await
    }

    async fn mark_finished(&self, id: ProjectId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.mark_finished(id, at).await
    }

    async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError> {
        self.inner.delete_project(id).await
    }

    async fn set_public(&self, id: ProjectId, value: bool) -> Result<bool, StoreError> {
        self.inner.set_public(id, value).await
    }

    async fn insert_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<(), StoreError> {
        self.inner.insert_permission(user_id, project_id).await
    }

    async fn delete_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError> {
        self.inner.delete_permission(user_id, project_id).await
    }

    async fn has_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError> {
        self.inner.has_permission(user_id, project_id).await
    }

    async fn permitted_project_ids(&self, user_id: Uuid) -> Result<Vec<ProjectId>, StoreError> {
        self.inner.permitted_project_ids(user_id).await
    }

    async fn projects_without_permissions(&self) -> Result<Vec<ProjectId>, StoreError> {
        self.inner.projects_without_permissions().await
    }

    async fn upsert_rating(&self, project_id: ProjectId, rater_id: Uuid, score: i32) -> Result<(), StoreError> {
        self.inner.upsert_rating(project_id, rater_id, score).await
    }

    async fn delete_rating(&self, project_id: ProjectId, rater_id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_rating(project_id, rater_id).await
    }

    async fn average_rating(&self, project_id: ProjectId) -> Result<Option<f64>, StoreError> {
        self.inner.average_rating(project_id).await
    }

    async fn insert_flag(&self, project_id: ProjectId, flagger_id: Uuid) -> Result<FlagOutcome, StoreError> {
        self.inner.insert_flag(project_id, flagger_id).await
    }

    async fn flag_count(&self, project_id: ProjectId) -> Result<u64, StoreError> {
        self.inner.flag_count(project_id).await
    }
}

async fn gated_state() -> (AppState, Arc<GatedStore>) {
    let gated = Arc::new(GatedStore::default());
    let state = AppState::from_store(test_config(), ProjectStoreAdapter::new(gated.clone())).await;
    (state, gated)
}

async fn next(session: &mut Session) -> Option<ServerMessage> {
    timeout(Duration::from_millis(50), session.next_outbound())
        .await
        .ok()
        .flatten()
}

fn paint(project_id: ProjectId, x: usize, y: usize) -> PixelEdit {
    PixelEdit {
        project_id,
        x,
        y,
        color: "#F00".to_string(),
    }
}

#[tokio::test]
async fn test_pixel_edit_completes_while_save_waits_on_store() {
    let (state, gated) = gated_state().await;
    let project = active_project(&state, &TestUser::new("ada"), "slow", 4).await;

    let id = project.id;
    let saver = tokio::spawn({
        let lifecycle = state.lifecycle.clone();
        async move { lifecycle.save_project(id).await }
    });
    gated.entered.notified().await;

    let mut painter = Session::new(state.hub.clone());
    let mut watcher = Session::new(state.hub.clone());
    dispatch(&state, &mut watcher, ClientMessage::JoinRoom { project_id: project.id }).await;

    let edit = paint(project.id, 1, 2);
    timeout(
        Duration::from_secs(1),
        dispatch(&state, &mut painter, ClientMessage::PixelEdit(edit.clone())),
    )
    .await
    .expect("pixel edit waited for the save");
    assert_eq!(next(&mut watcher).await, Some(ServerMessage::Pixel(edit)));

    gated.release.notify_one();
    saver.await.unwrap().unwrap();

    // The edit landed after the snapshot: kept in memory, not yet stored
    let live = state.projects_snapshot().await;
    assert_eq!(live[0].grid.cell(1, 2), Some("#F00"));
    let stored = state.store.load_project_by_id(project.id).await.unwrap();
    assert_eq!(stored.grid.cell(1, 2), Some("#FFF"));
}

#[tokio::test]
async fn test_other_projects_stay_editable_during_finish() {
    let (state, gated) = gated_state().await;
    let ada = TestUser::new("ada");
    let finishing = active_project(&state, &ada, "done", 4).await;
    let other = active_project(&state, &ada, "busy", 4).await;

    let finishing_id = finishing.id;
    let finisher = tokio::spawn({
        let lifecycle = state.lifecycle.clone();
        async move { lifecycle.finish_project(finishing_id).await }
    });
    gated.entered.notified().await;

    let mut painter = Session::new(state.hub.clone());
    timeout(
        Duration::from_secs(1),
        dispatch(&state, &mut painter, ClientMessage::PixelEdit(paint(other.id, 0, 0))),
    )
    .await
    .expect("pixel edit waited for the finish");
    // Edits to the project being finished are ignored
    dispatch(&state, &mut painter, ClientMessage::PixelEdit(paint(finishing.id, 0, 0))).await;

    gated.release.notify_one();
    let outcome = finisher.await.unwrap().unwrap();
    assert_eq!(outcome.next_current, Some(other.id));
    assert_eq!(outcome.project.grid.cell(0, 0), Some("#FFF"));

    let live = state.projects_snapshot().await;
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].grid.cell(0, 0), Some("#F00"));
}
