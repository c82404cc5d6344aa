//! Gallery HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::backend::error::BackendError;
use crate::backend::gallery::GalleryService;
use crate::backend::middleware::{bearer_token, AuthUser};
use crate::shared::{FlagOutcome, GalleryEntry, ProjectId, RatingRequest, SortMode};

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    /// `rating`, `new`, `myGallery` or `flagged`; defaults to `new`
    pub sort: Option<String>,
}

/// List the gallery in one sort mode (GET /api/gallery?sort=...)
///
/// `myGallery` reads the caller from the Authorization header; without a
/// valid token it returns an empty list rather than 401.
pub async fn list_gallery(
    State(gallery): State<GalleryService>,
    Query(query): Query<GalleryQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<GalleryEntry>>, BackendError> {
    let mode = SortMode::parse(query.sort.as_deref().unwrap_or("new"));
    let entries = gallery.list_gallery().await?;
    let sorted = gallery.sort_gallery(entries, &mode, bearer_token(&headers)).await;
    Ok(Json(sorted))
}

/// Rate a finished project (PUT /api/gallery/{id}/rating)
pub async fn rate_project(
    State(gallery): State<GalleryService>,
    AuthUser(identity): AuthUser,
    Path(project_id): Path<ProjectId>,
    Json(request): Json<RatingRequest>,
) -> Result<StatusCode, BackendError> {
    gallery.rate_project(project_id, identity.user_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Withdraw the caller's rating (DELETE /api/gallery/{id}/rating)
pub async fn delete_rating(
    State(gallery): State<GalleryService>,
    AuthUser(identity): AuthUser,
    Path(project_id): Path<ProjectId>,
) -> Result<StatusCode, BackendError> {
    if gallery.delete_rating(project_id, identity.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(BackendError::not_found(format!("no rating for project {}", project_id)))
    }
}

/// Flag a finished project (POST /api/gallery/{id}/flags)
///
/// 201 for a new flag, 409 if the caller already flagged it.
pub async fn flag_project(
    State(gallery): State<GalleryService>,
    AuthUser(identity): AuthUser,
    Path(project_id): Path<ProjectId>,
) -> Result<(StatusCode, Json<FlagOutcome>), BackendError> {
    match gallery.flag_project(project_id, identity.user_id).await? {
        FlagOutcome::Created => Ok((StatusCode::CREATED, Json(FlagOutcome::Created))),
        FlagOutcome::AlreadyExists => Err(BackendError::conflict("already exists")),
    }
}
