//! Generation record and provider task models.

use serde::Serialize;
use sqlx::FromRow;
use sangeet_core::types::{DbId, Timestamp};

use super::status::{GenerationStatus, StatusId};

/// A single generation request and, once resolved, its artifact.
///
/// Created without an artifact at submission; the artifact columns are
/// written at most once.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationRecord {
    pub id: DbId,
    pub parameters: serde_json::Value,
    pub prompt: String,
    pub artifact_url: Option<String>,
    pub artifact_urls: Vec<String>,
    pub title: Option<String>,
    pub status_id: StatusId,
    pub error_message: Option<String>,
    pub regenerated_from: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl GenerationRecord {
    /// Typed status. Unknown ids read as pending, which never short-circuits
    /// a poll.
    pub fn status(&self) -> GenerationStatus {
        GenerationStatus::from_id(self.status_id).unwrap_or(GenerationStatus::Pending)
    }

    pub fn has_artifact(&self) -> bool {
        self.artifact_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// The provider-assigned handle for a record's generation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationTask {
    pub id: DbId,
    pub task_id: String,
    pub record_id: DbId,
    pub status_id: StatusId,
    pub submitted_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GenerationTask {
    pub fn status(&self) -> GenerationStatus {
        GenerationStatus::from_id(self.status_id).unwrap_or(GenerationStatus::Pending)
    }
}

/// DTO for inserting a pending record.
#[derive(Debug, Clone)]
pub struct NewGenerationRecord {
    pub parameters: serde_json::Value,
    pub prompt: String,
    pub regenerated_from: Option<DbId>,
}

/// The artifact written by a completion signal.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactUpdate {
    pub primary_url: String,
    pub all_urls: Vec<String>,
    pub title: Option<String>,
}
