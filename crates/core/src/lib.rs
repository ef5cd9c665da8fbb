//! Shared domain types for the Sangeet generation orchestrator.
//!
//! Zero internal dependencies so every other crate (db, provider,
//! orchestrator, api) can use it.

pub mod audit;
pub mod error;
pub mod generation;
pub mod types;
