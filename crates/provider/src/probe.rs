//! Status-endpoint discovery.
//!
//! The provider's status path is not documented reliably, so a list of
//! candidate templates is tried in order until one answers with JSON. The
//! result (including "none answered") is memoized in an
//! [`EndpointAvailabilityCache`] so a missing endpoint costs one round of
//! probes per TTL window instead of one per poll.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tokio::time::Instant;

use crate::availability::{Availability, EndpointAvailabilityCache};
use crate::error::ProviderError;
use crate::provider::{GenerationProvider, StatusFetch};

/// Placeholder substituted in status path templates.
pub const TASK_ID_PLACEHOLDER: &str = "{task_id}";

/// Result of a single status probe.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// A candidate answered with JSON.
    Found { path_index: usize, body: Value },
    /// No candidate exists (cached or freshly discovered).
    Unavailable,
    /// A hard failure (auth, 5xx, transport). Not memoized.
    Failed(ProviderError),
}

/// Discovers and queries the provider status endpoint.
pub struct StatusProber {
    paths: Vec<String>,
    cache: Arc<EndpointAvailabilityCache>,
    log: ProbeLogLimiter,
}

impl StatusProber {
    pub fn new(
        paths: Vec<String>,
        cache: Arc<EndpointAvailabilityCache>,
        log_interval: Duration,
    ) -> Self {
        Self {
            paths,
            cache,
            log: ProbeLogLimiter::new(log_interval),
        }
    }

    pub fn cache(&self) -> &EndpointAvailabilityCache {
        &self.cache
    }

    /// Query the provider's status for `task_id`.
    pub async fn probe(&self, provider: &dyn GenerationProvider, task_id: &str) -> ProbeOutcome {
        match self.cache.current() {
            Availability::Unavailable => ProbeOutcome::Unavailable,
            Availability::Unknown => self.discover(provider, task_id, None).await,
            Availability::Available { path_index } => {
                match self.fetch(provider, path_index, task_id).await {
                    Ok(StatusFetch::Json(body)) => ProbeOutcome::Found { path_index, body },
                    Ok(_) => {
                        tracing::info!(
                            path = %self.paths[path_index],
                            "Cached status endpoint stopped answering, re-discovering",
                        );
                        self.cache.reset();
                        self.discover(provider, task_id, Some(path_index)).await
                    }
                    Err(e) => self.hard_failure(e),
                }
            }
        }
    }

    async fn discover(
        &self,
        provider: &dyn GenerationProvider,
        task_id: &str,
        skip: Option<usize>,
    ) -> ProbeOutcome {
        for path_index in (0..self.paths.len()).filter(|i| Some(*i) != skip) {
            match self.fetch(provider, path_index, task_id).await {
                Ok(StatusFetch::Json(body)) => {
                    self.cache.mark_available(path_index);
                    if self.log.should_log(ProbeLogState::Available(path_index)) {
                        tracing::info!(
                            path = %self.paths[path_index],
                            "Discovered provider status endpoint",
                        );
                    }
                    return ProbeOutcome::Found { path_index, body };
                }
                Ok(fetch) => {
                    tracing::debug!(
                        path = %self.paths[path_index],
                        not_json = matches!(fetch, StatusFetch::NotJson),
                        "Status candidate missing",
                    );
                }
                Err(e) => return self.hard_failure(e),
            }
        }

        self.cache.mark_unavailable();
        if self.log.should_log(ProbeLogState::Unavailable) {
            tracing::warn!(
                candidates = self.paths.len(),
                ttl_secs = self.cache.ttl().as_secs(),
                "No provider status endpoint found, relying on webhooks",
            );
        }
        ProbeOutcome::Unavailable
    }

    async fn fetch(
        &self,
        provider: &dyn GenerationProvider,
        path_index: usize,
        task_id: &str,
    ) -> Result<StatusFetch, ProviderError> {
        provider
            .fetch_status(&render_path(&self.paths[path_index], task_id))
            .await
    }

    fn hard_failure(&self, error: ProviderError) -> ProbeOutcome {
        if self.log.should_log(ProbeLogState::Failing) {
            tracing::warn!(error = %error, "Provider status probe failed");
        }
        ProbeOutcome::Failed(error)
    }
}

/// Characters left bare in a rendered task id (RFC 3986 unreserved).
const TASK_ID_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Substitute the percent-encoded task id into a path template.
pub fn render_path(template: &str, task_id: &str) -> String {
    let encoded = utf8_percent_encode(task_id, TASK_ID_SET).to_string();
    template.replace(TASK_ID_PLACEHOLDER, &encoded)
}

/// Probe state as far as logging is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeLogState {
    Available(usize),
    Unavailable,
    Failing,
}

/// Logs probe results on state change, or at most once per interval.
#[derive(Debug)]
pub struct ProbeLogLimiter {
    interval: Duration,
    last: Mutex<Option<(ProbeLogState, Instant)>>,
}

impl ProbeLogLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<(ProbeLogState, Instant)>> {
        self.last.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `state` should be logged now. Records it if so.
    pub fn should_log(&self, state: ProbeLogState) -> bool {
        let mut last = self.lock();
        let due = match *last {
            Some((prev, at)) => prev != state || at.elapsed() >= self.interval,
            None => true,
        };
        if due {
            *last = Some((state, Instant::now()));
        }
        due
    }
}
