/**
 * Realtime Message Protocol
 *
 * This module defines the messages exchanged over the realtime connection.
 * Both directions are tagged enums serialized as JSON text frames with a
 * `type` field, e.g.:
 *
 * ```json
 * {"type":"pixel_edit","project_id":3,"x":1,"y":2,"color":"#000"}
 * ```
 *
 * Every inbound kind maps to exactly one handler in the dispatcher; there are
 * no free-form event names.
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::gallery::GalleryEntry;
use crate::shared::grid::Grid;
use crate::shared::project::{CreateProjectRequest, PixelEdit, Project, ProjectId};

/// Messages sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a project's room
    JoinRoom { project_id: ProjectId },
    /// Unsubscribe from a project's room
    LeaveRoom { project_id: ProjectId },
    /// Ask for the current grid of one project
    RequestGrid { project_id: ProjectId },
    /// Change one cell
    PixelEdit(PixelEdit),
    /// Ask for every active project
    RequestSnapshot,
    /// Create a project owned by the bearer of `token`
    CreateProject {
        token: String,
        request: CreateProjectRequest,
    },
    /// Flush the in-memory grid to the store
    SaveProject { project_id: ProjectId },
    /// Drop an unfinished project
    DeleteProject { project_id: ProjectId },
    /// Finish a project and hand it to the gallery
    FinishProject { project_id: ProjectId },
    /// Ask for the public gallery
    RequestGallery,
}

impl ClientMessage {
    /// Decode a text frame
    pub fn decode(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join_room",
            Self::LeaveRoom { .. } => "leave_room",
            Self::RequestGrid { .. } => "request_grid",
            Self::PixelEdit(_) => "pixel_edit",
            Self::RequestSnapshot => "request_snapshot",
            Self::CreateProject { .. } => "create_project",
            Self::SaveProject { .. } => "save_project",
            Self::DeleteProject { .. } => "delete_project",
            Self::FinishProject { .. } => "finish_project",
            Self::RequestGallery => "request_gallery",
        }
    }
}

/// Messages sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to `RequestGrid`
    Grid { project_id: ProjectId, grid: Grid },
    /// An applied edit, fanned out to the project's room
    Pixel(PixelEdit),
    /// Every active project; sent to all connections after list changes
    Projects { projects: Vec<Project> },
    /// Project clients should select after the current one went away
    CurrentProject { project_id: ProjectId },
    /// Reply to `RequestGallery`
    Gallery { projects: Vec<GalleryEntry> },
    /// Failure acknowledgement, sent to the originating connection only
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Encode as a text frame
    pub fn encode(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Grid { .. } => "grid",
            Self::Pixel(_) => "pixel",
            Self::Projects { .. } => "projects",
            Self::CurrentProject { .. } => "current_project",
            Self::Gallery { .. } => "gallery",
            Self::Error { .. } => "error",
        }
    }
}
