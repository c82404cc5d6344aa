/**
 * Project Data Structures
 *
 * This module defines the project types shared between the realtime layer,
 * the HTTP API and the store. A project is a named canvas with fixed
 * dimensions, a grid of colors, and a small lifecycle:
 *
 * - **Active** while it lives in the registry and is being edited
 * - **Finished** once an editor finishes it; it never goes back
 *
 * Independently of that, a project may be promoted to **public**, which is
 * what default gallery views require.
 */
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::grid::Grid;

/// Store-assigned project identifier
pub type ProjectId = i64;

/// Countdown chosen when a project is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerSelector {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    /// No deadline
    #[default]
    #[serde(rename = "unlimited")]
    Unlimited,
}

impl TimerSelector {
    pub const ALL: [TimerSelector; 7] = [
        TimerSelector::OneMinute,
        TimerSelector::ThreeMinutes,
        TimerSelector::FiveMinutes,
        TimerSelector::FifteenMinutes,
        TimerSelector::OneHour,
        TimerSelector::OneDay,
        TimerSelector::Unlimited,
    ];

    /// Length of the countdown, `None` for [`TimerSelector::Unlimited`]
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::OneMinute => Some(Duration::minutes(1)),
            Self::ThreeMinutes => Some(Duration::minutes(3)),
            Self::FiveMinutes => Some(Duration::minutes(5)),
            Self::FifteenMinutes => Some(Duration::minutes(15)),
            Self::OneHour => Some(Duration::hours(1)),
            Self::OneDay => Some(Duration::days(1)),
            Self::Unlimited => None,
        }
    }

    /// Wire and storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::ThreeMinutes => "3m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
            Self::Unlimited => "unlimited",
        }
    }

    /// Deadline for a project started at `start`
    pub fn deadline_from(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().map(|d| start + d)
    }

    /// Parse a selector, mapping anything unrecognized to `Unlimited`.
    ///
    /// Used for rows written by older clients.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unlimited)
    }

    /// Parse a selector at an input boundary.
    ///
    /// With `lenient` off an unknown selector is a validation error; with it on
    /// the legacy fallback to `Unlimited` applies.
    pub fn resolve(raw: &str, lenient: bool) -> Result<Self, SharedError> {
        match raw.parse::<Self>() {
            Ok(timer) => Ok(timer),
            Err(_) if lenient => {
                tracing::debug!("Unknown timer selector {:?}, using unlimited", raw);
                Ok(Self::Unlimited)
            }
            Err(e) => Err(e),
        }
    }
}

impl std::str::FromStr for TimerSelector {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|timer| timer.as_str() == normalized)
            .ok_or_else(|| SharedError::validation("timer", format!("unknown timer selector '{}'", s)))
    }
}

impl std::fmt::Display for TimerSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPhase {
    Active,
    Finished,
}

/// A canvas and its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub name: String,
    pub xsize: i64,
    pub ysize: i64,
    pub grid: Grid,
    pub finished: bool,
    pub started_at: Option<DateTime<Utc>>,
    /// Deadline while active, time of finishing once finished
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub timer: TimerSelector,
}

impl Project {
    pub fn phase(&self) -> ProjectPhase {
        if self.finished {
            ProjectPhase::Finished
        } else {
            ProjectPhase::Active
        }
    }

    /// Time left before the informational deadline.
    ///
    /// `None` for finished projects and for projects without a deadline.
    /// Nothing enforces the deadline; it only drives client countdowns.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.finished {
            return None;
        }
        self.finished_at
            .map(|deadline| (deadline - now).max(Duration::zero()))
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            owner_name: self.owner_name.clone(),
            xsize: self.xsize,
            ysize: self.ysize,
            timer: self.timer,
            finished_at: self.finished_at,
        }
    }
}

/// Lightweight listing entry without the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub owner_name: String,
    pub xsize: i64,
    pub ysize: i64,
    pub timer: TimerSelector,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A single cell change sent by an editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelEdit {
    pub project_id: ProjectId,
    pub x: usize,
    pub y: usize,
    pub color: String,
}

/// Parameters for a new project, as sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub xsize: i64,
    pub ysize: i64,
    /// Timer selector as typed by the client, e.g. `"5m"` or `"unlimited"`
    #[serde(default = "default_timer")]
    pub timer: String,
}

fn default_timer() -> String {
    TimerSelector::Unlimited.as_str().to_string()
}
