//! Project HTTP Handlers
//!
//! Thin wrappers over `LifecycleManager` and the store adapter. Every
//! mutation that changes the active project list is followed by the same
//! global `Projects` broadcast the realtime path sends.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::Identity;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::realtime::dispatch::announce_removal;
use crate::backend::registry::SharedRegistry;
use crate::backend::server::state::AppState;
use crate::shared::{CreateProjectRequest, Project, ProjectId, ProjectSummary};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetPublicRequest {
    pub is_public: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrantRequest {
    pub user_id: Uuid,
}

/// Caller must hold a permission grant for `project_id`
async fn require_grant(state: &AppState, identity: &Identity, project_id: ProjectId) -> Result<(), BackendError> {
    if state.store.has_permission(identity.user_id, project_id).await? {
        Ok(())
    } else {
        tracing::warn!("{} has no grant for project {}", identity.user_id, project_id);
        Err(BackendError::forbidden(format!("no permission for project {}", project_id)))
    }
}

/// List active projects (GET /api/projects)
pub async fn list_projects(State(registry): State<SharedRegistry>) -> Json<Vec<ProjectSummary>> {
    Json(registry.read().await.summaries())
}

/// Create a project owned by the caller (POST /api/projects)
pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), BackendError> {
    let project = state.lifecycle.create_project_for(&identity, &request).await?;
    state.broadcast_projects().await;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Fetch one project (GET /api/projects/{id})
///
/// Active projects come from the registry so the grid is live; finished ones
/// come from the store.
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Project>, BackendError> {
    let live = state.registry.read().await.find_by_id(project_id).cloned();
    if let Some(project) = live {
        return Ok(Json(project));
    }
    Ok(Json(state.store.load_project_by_id(project_id).await?))
}

/// Delete a project that never finished (DELETE /api/projects/{id})
pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(project_id): Path<ProjectId>,
) -> Result<StatusCode, BackendError> {
    require_grant(&state, &identity, project_id).await?;
    let next_current = state.lifecycle.delete_project(project_id).await?;
    announce_removal(&state, next_current).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Persist the live grid (POST /api/projects/{id}/save)
pub async fn save_project(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(project_id): Path<ProjectId>,
) -> Result<StatusCode, BackendError> {
    require_grant(&state, &identity, project_id).await?;
    state.lifecycle.save_project(project_id).await?;
    state.broadcast_projects().await;
    Ok(StatusCode::NO_CONTENT)
}

/// Finish a project (POST /api/projects/{id}/finish)
pub async fn finish_project(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Project>, BackendError> {
    require_grant(&state, &identity, project_id).await?;
    let outcome = state.lifecycle.finish_project(project_id).await?;
    announce_removal(&state, outcome.next_current).await;
    Ok(Json(outcome.project))
}

/// Publish a project (PUT /api/projects/{id}/public)
pub async fn set_public(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(project_id): Path<ProjectId>,
    Json(request): Json<SetPublicRequest>,
) -> Result<Json<SetPublicRequest>, BackendError> {
    require_grant(&state, &identity, project_id).await?;
    let is_public = state.lifecycle.set_public(project_id, request.is_public).await?;
    Ok(Json(SetPublicRequest { is_public }))
}

/// Give another user access (POST /api/projects/{id}/permissions)
pub async fn grant_permission(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(project_id): Path<ProjectId>,
    Json(request): Json<GrantRequest>,
) -> Result<StatusCode, BackendError> {
    require_grant(&state, &identity, project_id).await?;
    state.store.grant_permission(request.user_id, project_id).await?;
    tracing::info!("{} granted {} access to project {}", identity.user_id, request.user_id, project_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a user's access (DELETE /api/projects/{id}/permissions/{user_id})
pub async fn revoke_permission(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path((project_id, user_id)): Path<(ProjectId, Uuid)>,
) -> Result<StatusCode, BackendError> {
    require_grant(&state, &identity, project_id).await?;
    if state.store.revoke_permission(user_id, project_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(BackendError::not_found(format!(
            "{} has no grant for project {}",
            user_id, project_id
        )))
    }
}
