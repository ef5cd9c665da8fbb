//! Request handlers.
//!
//! Handlers are thin: they extract the request, call the [`Orchestrator`]
//! and wrap the result in a [`DataResponse`]. Errors map through
//! [`AppError`].
//!
//! [`Orchestrator`]: sangeet_orchestrator::Orchestrator
//! [`DataResponse`]: crate::response::DataResponse
//! [`AppError`]: crate::error::AppError

pub mod generations;
pub mod webhooks;
