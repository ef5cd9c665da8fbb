//! Client library for the external music-generation provider.
//!
//! Provides the [`GenerationProvider`] seam and its HTTP implementation,
//! typed parsing of the provider's loosely-shaped webhook and status
//! payloads, and runtime discovery of a working status endpoint.

pub mod api;
pub mod availability;
pub mod callback;
pub mod config;
pub mod error;
pub mod probe;
pub mod provider;
pub mod status;

pub use api::ProviderApi;
pub use availability::{Availability, EndpointAvailabilityCache};
pub use callback::{CallbackShape, NormalizedCallback, ProviderSignal};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use probe::{ProbeOutcome, StatusProber};
pub use provider::{GenerationProvider, StatusFetch, SubmitRequest};
