//! Gallery Types
//!
//! Finished projects are surfaced through the gallery together with their
//! average rating and the number of moderation flags they received.

use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::project::Project;

/// Flag count at which a project is held for moderator review
pub const FLAG_THRESHOLD: u64 = 2;

/// Lowest accepted rating score
pub const MIN_SCORE: i32 = 1;

/// Highest accepted rating score
pub const MAX_SCORE: i32 = 10;

/// A finished project with its gallery annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub project: Project,
    /// Mean of all ratings, `None` while unrated
    pub average_rating: Option<f64>,
    pub flag_count: u64,
}

impl GalleryEntry {
    /// Wrap a project with empty annotations
    pub fn new(project: Project) -> Self {
        Self {
            project,
            average_rating: None,
            flag_count: 0,
        }
    }

    /// Held back from public views once the flag threshold is reached
    pub fn is_flagged(&self) -> bool {
        self.flag_count >= FLAG_THRESHOLD
    }

    /// Eligible for the public `rating` and `new` views
    pub fn is_publicly_visible(&self) -> bool {
        self.project.is_public && !self.is_flagged()
    }
}

/// Ordering and filtering applied to a gallery listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortMode {
    /// Highest average rating first, public and unflagged only
    Rating,
    /// Most recently finished first, public and unflagged only
    New,
    /// Projects the caller holds a permission grant for
    MyGallery,
    /// Projects at or above the flag threshold
    Flagged,
    /// Anything else; yields an empty listing
    Unknown(String),
}

impl SortMode {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "rating" => Self::Rating,
            "new" => Self::New,
            "myGallery" => Self::MyGallery,
            "flagged" => Self::Flagged,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<&str> for SortMode {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Rating submission body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub score: i32,
}

impl RatingRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if (MIN_SCORE..=MAX_SCORE).contains(&self.score) {
            Ok(())
        } else {
            Err(SharedError::validation(
                "score",
                format!("score must be between {} and {}", MIN_SCORE, MAX_SCORE),
            ))
        }
    }
}

/// Result of a flag submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagOutcome {
    Created,
    /// The same user already flagged this project; nothing was written
    AlreadyExists,
}
