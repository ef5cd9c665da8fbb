//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or any executor) as the first argument.

pub mod audit_log_repo;
pub mod generation_record_repo;
pub mod generation_task_repo;

pub use audit_log_repo::AuditLogRepo;
pub use generation_record_repo::GenerationRecordRepo;
pub use generation_task_repo::GenerationTaskRepo;
