//! Asynchronous generation-task orchestration.
//!
//! Dispatches generation requests to the provider and converges the two
//! completion paths (provider webhooks and client-driven status polls) onto
//! one idempotent [`Reconciler`].

pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod reconciler;
pub mod registry;
pub mod webhook;

pub use config::OrchestratorConfig;
pub use dispatcher::Dispatched;
pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;
pub use poller::GenerationStatusView;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use registry::TaskRegistry;
pub use webhook::WebhookOutcome;
