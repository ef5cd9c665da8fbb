//! Audit log event names for generation tasks.
//!
//! Lives in `core` so the store, the orchestrator and the API agree on the
//! vocabulary written to the append-only `generation_audit_log` table.

/// Known event names for audit log entries.
pub mod events {
    /// The provider accepted the request and assigned a task id.
    pub const DISPATCHED: &str = "dispatched";
    /// The provider reported the task as in progress.
    pub const PROCESSING: &str = "processing";
    /// An artifact was attached and the task reached COMPLETE.
    pub const COMPLETED: &str = "completed";
    /// The task reached FAILED.
    pub const FAILED: &str = "failed";
    /// A completion or failure signal arrived for an already-terminal task.
    pub const DUPLICATE_SIGNAL: &str = "duplicate_signal";
    /// A completion-looking signal arrived without a usable artifact URL.
    pub const AMBIGUOUS_COMPLETION: &str = "ambiguous_completion";
    /// A webhook named a task id that no registry or store lookup knows.
    pub const UNKNOWN_TASK: &str = "unknown_task";
}

/// Source of a completion signal, recorded in audit details.
pub mod sources {
    pub const WEBHOOK: &str = "webhook";
    pub const POLL: &str = "poll";
}
