//! Generation status enum mapping to the `generation_statuses` lookup table.
//!
//! Discriminants match the seed data in the initial migration.

use serde::Serialize;

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Per-task lifecycle shared by the webhook and poll paths.
///
/// ```text
/// PENDING -> PROCESSING -> { COMPLETE, FAILED }
///    \_________________________/^
/// ```
///
/// COMPLETE and FAILED are terminal.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending = 1,
    Processing = 2,
    Complete = 3,
    Failed = 4,
}

/// Statuses a task can still leave.
pub const OPEN_STATUSES: [StatusId; 2] = [
    GenerationStatus::Pending as StatusId,
    GenerationStatus::Processing as StatusId,
];

impl GenerationStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Resolve a database status ID.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Processing),
            3 => Some(Self::Complete),
            4 => Some(Self::Failed),
            _ => None,
        }
    }

    /// Lowercase name, as exposed over the API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Complete)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Complete)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl From<GenerationStatus> for StatusId {
    fn from(value: GenerationStatus) -> Self {
        value as StatusId
    }
}
