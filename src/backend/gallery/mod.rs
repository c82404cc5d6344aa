//! Gallery & Moderation
//!
//! The gallery is the set of finished projects, each annotated with its
//! average rating and flag count. Annotation runs one store query per entry
//! and per annotation; all of them are awaited together before a listing is
//! returned, and a failed query only leaves that entry's annotation at its
//! default.
//!
//! # Sort modes
//!
//! | mode        | filter                                  | order                         |
//! |-------------|-----------------------------------------|-------------------------------|
//! | `rating`    | public and fewer than 2 flags           | average rating, descending    |
//! | `new`       | public and fewer than 2 flags           | `finished_at`, descending     |
//! | `myGallery` | caller holds a permission grant         | unchanged                     |
//! | `flagged`   | 2 or more flags                         | unchanged                     |
//! | other       | everything removed                      |                               |

use futures_util::future::join_all;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::backend::auth::IdentityVerifier;
use crate::backend::store::{ProjectStoreAdapter, StoreError};
use crate::shared::{FlagOutcome, GalleryEntry, ProjectId, RatingRequest, SharedError, SortMode};

/// HTTP handlers for gallery routes
pub mod handlers;

/// Gallery failures
#[derive(Debug, Error)]
pub enum GalleryError {
    /// No finished project with this id
    #[error("project {0} is not in the gallery")]
    NotInGallery(ProjectId),

    #[error(transparent)]
    Validation(#[from] SharedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Listing, sorting, rating and flagging of finished projects
#[derive(Clone)]
pub struct GalleryService {
    store: ProjectStoreAdapter,
    verifier: Arc<dyn IdentityVerifier>,
}

impl GalleryService {
    pub fn new(store: ProjectStoreAdapter, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { store, verifier }
    }

    /// All finished projects with ratings and flag counts filled in
    pub async fn list_gallery(&self) -> Result<Vec<GalleryEntry>, StoreError> {
        let projects = self.store.load_finished_projects().await?;
        let gallery = projects.into_iter().map(GalleryEntry::new).collect();
        let gallery = self.annotate_ratings(gallery).await;
        Ok(self.annotate_flags(gallery).await)
    }

    /// Finished and public projects, the default realtime gallery view
    pub async fn public_gallery(&self) -> Result<Vec<GalleryEntry>, StoreError> {
        let mut gallery = self.list_gallery().await?;
        gallery.retain(|entry| entry.project.is_public);
        Ok(gallery)
    }

    pub async fn annotate_ratings(&self, gallery: Vec<GalleryEntry>) -> Vec<GalleryEntry> {
        let averages = join_all(
            gallery
                .iter()
                .map(|entry| self.store.average_rating(entry.project.id)),
        )
        .await;

        gallery
            .into_iter()
            .zip(averages)
            .map(|(mut entry, average)| {
                match average {
                    Ok(average) => entry.average_rating = average,
                    Err(e) => tracing::error!(
                        "[Gallery] Failed to load rating for project {}: {}",
                        entry.project.id,
                        e
                    ),
                }
                entry
            })
            .collect()
    }

    pub async fn annotate_flags(&self, gallery: Vec<GalleryEntry>) -> Vec<GalleryEntry> {
        let counts = join_all(
            gallery
                .iter()
                .map(|entry| self.store.flag_count(entry.project.id)),
        )
        .await;

        gallery
            .into_iter()
            .zip(counts)
            .map(|(mut entry, count)| {
                match count {
                    Ok(count) => entry.flag_count = count,
                    Err(e) => tracing::error!(
                        "[Gallery] Failed to load flags for project {}: {}",
                        entry.project.id,
                        e
                    ),
                }
                entry
            })
            .collect()
    }

    /// Filter and order a gallery for one view.
    ///
    /// `actor_token` is only consulted for `myGallery`; a missing or invalid
    /// token yields an empty view.
    pub async fn sort_gallery(
        &self,
        gallery: Vec<GalleryEntry>,
        mode: &SortMode,
        actor_token: Option<&str>,
    ) -> Vec<GalleryEntry> {
        match mode {
            SortMode::Rating => sort_by_rating(gallery),
            SortMode::New => sort_by_newest(gallery),
            SortMode::Flagged => only_flagged(gallery),
            SortMode::MyGallery => {
                let Some(user_id) = actor_token.and_then(|token| self.actor(token)) else {
                    return Vec::new();
                };
                match self.store.permitted_project_ids(user_id).await {
                    Ok(permitted) => only_permitted(gallery, &permitted),
                    Err(e) => {
                        tracing::error!("[Gallery] Failed to load grants for {}: {}", user_id, e);
                        Vec::new()
                    }
                }
            }
            SortMode::Unknown(raw) => {
                tracing::debug!("[Gallery] Unknown sort mode '{}'", raw);
                Vec::new()
            }
        }
    }

    fn actor(&self, token: &str) -> Option<Uuid> {
        match self.verifier.verify(token) {
            Ok(identity) => Some(identity.user_id),
            Err(e) => {
                tracing::debug!("[Gallery] Ignoring invalid actor token: {}", e);
                None
            }
        }
    }

    /// Insert or overwrite `rater_id`'s score for a finished project
    pub async fn rate_project(
        &self,
        project_id: ProjectId,
        rater_id: Uuid,
        request: RatingRequest,
    ) -> Result<(), GalleryError> {
        request.validate()?;
        self.require_finished(project_id).await?;
        self.store.rate_project(project_id, rater_id, request.score).await?;
        tracing::info!("[Gallery] {} rated project {} with {}", rater_id, project_id, request.score);
        Ok(())
    }

    /// Returns false when there was no rating to remove
    pub async fn delete_rating(&self, project_id: ProjectId, rater_id: Uuid) -> Result<bool, GalleryError> {
        self.require_finished(project_id).await?;
        Ok(self.store.delete_rating(project_id, rater_id).await?)
    }

    /// Record a moderation flag. A second flag by the same user is rejected
    /// with `AlreadyExists` and leaves the count unchanged.
    pub async fn flag_project(&self, project_id: ProjectId, flagger_id: Uuid) -> Result<FlagOutcome, GalleryError> {
        self.require_finished(project_id).await?;
        let outcome = self.store.flag_project(project_id, flagger_id).await?;
        match outcome {
            FlagOutcome::Created => tracing::info!("[Gallery] {} flagged project {}", flagger_id, project_id),
            FlagOutcome::AlreadyExists => {
                tracing::debug!("[Gallery] {} already flagged project {}", flagger_id, project_id)
            }
        }
        Ok(outcome)
    }

    async fn require_finished(&self, project_id: ProjectId) -> Result<(), GalleryError> {
        match self.store.load_project_by_id(project_id).await {
            Ok(project) if project.finished => Ok(()),
            Ok(_) | Err(StoreError::NotFound(_)) => Err(GalleryError::NotInGallery(project_id)),
            Err(e) => Err(e.into()),
        }
    }
}

fn compare_ratings(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Publicly visible entries, best rated first, unrated last
pub fn sort_by_rating(gallery: Vec<GalleryEntry>) -> Vec<GalleryEntry> {
    let mut visible: Vec<_> = gallery.into_iter().filter(GalleryEntry::is_publicly_visible).collect();
    visible.sort_by(|a, b| compare_ratings(a.average_rating, b.average_rating));
    visible
}

/// Publicly visible entries, most recently finished first.
///
/// The sort is stable; entries without `finished_at` go last.
pub fn sort_by_newest(gallery: Vec<GalleryEntry>) -> Vec<GalleryEntry> {
    let mut visible: Vec<_> = gallery.into_iter().filter(GalleryEntry::is_publicly_visible).collect();
    visible.sort_by(|a, b| match (a.project.finished_at, b.project.finished_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    visible
}

/// Entries at or above the flag threshold, public or not
pub fn only_flagged(gallery: Vec<GalleryEntry>) -> Vec<GalleryEntry> {
    gallery.into_iter().filter(GalleryEntry::is_flagged).collect()
}

/// Entries the caller holds a grant for
pub fn only_permitted(gallery: Vec<GalleryEntry>, permitted: &HashSet<ProjectId>) -> Vec<GalleryEntry> {
    gallery
        .into_iter()
        .filter(|entry| permitted.contains(&entry.project.id))
        .collect()
}
