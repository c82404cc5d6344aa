/**
 * Realtime Dispatcher
 *
 * Maps every `ClientMessage` kind to its handler. Handlers reply to the
 * sender through the session, fan out to a room through the hub, or
 * broadcast the project list to every connection.
 *
 * # Ordering
 *
 * Store writes complete before the broadcast that reflects them. Pixel edits
 * are broadcast while the registry write lock is still held, so members of a
 * room see edits in the order they were applied.
 *
 * # Failures
 *
 * Unknown projects are ignored. Any other failure is logged, acknowledged to
 * the sender with `ServerMessage::Error`, and, if the store was involved,
 * followed by the usual global broadcast of the in-memory state.
 */

use crate::backend::lifecycle::LifecycleError;
use crate::backend::realtime::session::Session;
use crate::backend::registry::PixelEditOutcome;
use crate::backend::server::state::AppState;
use crate::shared::{ClientMessage, CreateProjectRequest, PixelEdit, ProjectId, ServerMessage};

/// Handle one inbound message
pub async fn dispatch(state: &AppState, session: &mut Session, message: ClientMessage) {
    tracing::debug!("[Realtime] Session {} sent {}", session.id(), message.kind());

    match message {
        ClientMessage::JoinRoom { project_id } => session.join(project_id),
        ClientMessage::LeaveRoom { project_id } => {
            session.leave(project_id);
        }
        ClientMessage::RequestGrid { project_id } => request_grid(state, session, project_id).await,
        ClientMessage::PixelEdit(edit) => pixel_edit(state, edit).await,
        ClientMessage::RequestSnapshot => {
            let projects = state.projects_snapshot().await;
            session.reply(ServerMessage::Projects { projects });
        }
        ClientMessage::CreateProject { token, request } => create_project(state, session, &token, &request).await,
        ClientMessage::SaveProject { project_id } => save_project(state, session, project_id).await,
        ClientMessage::DeleteProject { project_id } => delete_project(state, session, project_id).await,
        ClientMessage::FinishProject { project_id } => finish_project(state, session, project_id).await,
        ClientMessage::RequestGallery => request_gallery(state, session).await,
    }
}

async fn request_grid(state: &AppState, session: &Session, project_id: ProjectId) {
    let registry = state.registry.read().await;
    match registry.find_by_id(project_id) {
        Some(project) => session.reply(ServerMessage::Grid {
            project_id,
            grid: project.grid.clone(),
        }),
        None => tracing::debug!("[Realtime] Grid requested for unknown project {}", project_id),
    }
}

async fn pixel_edit(state: &AppState, edit: PixelEdit) {
    let mut registry = state.registry.write().await;
    if registry.apply_pixel_edit(&edit) == PixelEditOutcome::Applied {
        let project_id = edit.project_id;
        state.hub.broadcast_to_room(project_id, ServerMessage::Pixel(edit));
    }
}

async fn create_project(state: &AppState, session: &Session, token: &str, request: &CreateProjectRequest) {
    match state.lifecycle.create_project(token, request).await {
        Ok(_) => {
            state.broadcast_projects().await;
        }
        Err(e) => report(state, session, e).await,
    }
}

async fn save_project(state: &AppState, session: &Session, project_id: ProjectId) {
    match state.lifecycle.save_project(project_id).await {
        Ok(()) => {
            state.broadcast_projects().await;
        }
        Err(e) => report(state, session, e).await,
    }
}

async fn delete_project(state: &AppState, session: &Session, project_id: ProjectId) {
    match state.lifecycle.delete_project(project_id).await {
        Ok(next_current) => announce_removal(state, next_current).await,
        Err(e) => report(state, session, e).await,
    }
}

async fn finish_project(state: &AppState, session: &Session, project_id: ProjectId) {
    match state.lifecycle.finish_project(project_id).await {
        Ok(outcome) => announce_removal(state, outcome.next_current).await,
        Err(e) => report(state, session, e).await,
    }
}

async fn request_gallery(state: &AppState, session: &Session) {
    match state.gallery.public_gallery().await {
        Ok(projects) => session.reply(ServerMessage::Gallery { projects }),
        Err(e) => {
            tracing::error!("[Realtime] Failed to load gallery: {}", e);
            session.reply(ServerMessage::error("store_failure", e.to_string()));
        }
    }
}

/// Point every client at a remaining project, then send the new list
pub(crate) async fn announce_removal(state: &AppState, next_current: Option<ProjectId>) {
    if let Some(project_id) = next_current {
        state.hub.broadcast_global(ServerMessage::CurrentProject { project_id });
    }
    state.broadcast_projects().await;
}

async fn report(state: &AppState, session: &Session, error: LifecycleError) {
    if matches!(error, LifecycleError::NotFound(_)) {
        tracing::debug!("[Realtime] Ignoring request for a missing project: {}", error);
        return;
    }

    tracing::warn!("[Realtime] Session {} request failed: {}", session.id(), error);
    session.reply(ServerMessage::error(error.code(), error.to_string()));

    if error.is_store_failure() {
        state.broadcast_projects().await;
    }
}
