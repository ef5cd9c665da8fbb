//! Memoized result of status-endpoint discovery.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

/// Cached knowledge about the provider's status endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Never probed, or the last result expired.
    Unknown,
    /// The candidate path at this index answered with JSON.
    Available { path_index: usize },
    /// Every candidate was tried and none answered with JSON.
    Unavailable,
}

/// Point-in-time view of the cache, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilitySnapshot {
    pub probed: bool,
    pub available: bool,
    pub path_index: Option<usize>,
    pub last_checked_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
struct Probed {
    path_index: Option<usize>,
    checked_at: Instant,
}

/// Process-wide cache of the discovered status endpoint.
///
/// Entries expire after `ttl`, after which the next poll re-discovers.
/// Uses [`tokio::time::Instant`] so expiry follows paused test clocks.
#[derive(Debug)]
pub struct EndpointAvailabilityCache {
    ttl: Duration,
    state: Mutex<Option<Probed>>,
}

impl EndpointAvailabilityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, Option<Probed>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fresh(&self) -> Option<Probed> {
        let probed = *self.lock();
        probed.filter(|p| p.checked_at.elapsed() < self.ttl)
    }

    /// Current availability, treating expired entries as unknown.
    pub fn current(&self) -> Availability {
        match self.fresh() {
            None => Availability::Unknown,
            Some(Probed {
                path_index: Some(path_index),
                ..
            }) => Availability::Available { path_index },
            Some(Probed {
                path_index: None, ..
            }) => Availability::Unavailable,
        }
    }

    pub fn snapshot(&self) -> AvailabilitySnapshot {
        let fresh = self.fresh();
        AvailabilitySnapshot {
            probed: fresh.is_some(),
            available: fresh.is_some_and(|p| p.path_index.is_some()),
            path_index: fresh.and_then(|p| p.path_index),
            last_checked_at: fresh.map(|p| p.checked_at),
        }
    }

    pub fn mark_available(&self, path_index: usize) {
        *self.lock() = Some(Probed {
            path_index: Some(path_index),
            checked_at: Instant::now(),
        });
    }

    pub fn mark_unavailable(&self) {
        *self.lock() = Some(Probed {
            path_index: None,
            checked_at: Instant::now(),
        });
    }

    /// Forget the cached result so the next poll re-discovers.
    pub fn reset(&self) {
        *self.lock() = None;
    }
}
