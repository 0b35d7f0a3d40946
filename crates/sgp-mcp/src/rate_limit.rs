//! Sliding-window rate limiter.
//!
//! Each key keeps the instants of its admitted calls. Entries older than the
//! window are dropped lazily whenever the key is checked; there is no
//! background sweep, so an idle key keeps its (stale) history until it is next
//! touched.
//!
//! Time comes from [`tokio::time::Instant`] so tests can drive it with a paused
//! clock.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Keyed sliding-window request counter. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl RateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a call under `key` if fewer than `max_requests` calls were
    /// admitted in the trailing `window`.
    ///
    /// Prune, check and record happen under one lock. A denied call records
    /// nothing.
    pub fn check_limit(&self, key: &str, max_requests: u32, window: Duration) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let timestamps = windows.entry(key.to_string()).or_default();

        prune(timestamps, now, window);

        if timestamps.len() >= max_requests as usize {
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Calls still available under `key` in the current window.
    #[must_use]
    pub fn remaining(&self, key: &str, max_requests: u32, window: Duration) -> u32 {
        let used = self.windows.lock().get(key).map_or(0, |t| live_count(t, Instant::now(), window));
        max_requests.saturating_sub(used as u32)
    }

    /// When the oldest call under `key` leaves the window. `now` if the key
    /// has no live history.
    #[must_use]
    pub fn next_reset(&self, key: &str, window: Duration) -> Instant {
        let now = Instant::now();
        self.windows
            .lock()
            .get(key)
            .and_then(|t| t.iter().find(|&&at| is_live(at, now, window)).copied())
            .map_or(now, |oldest| oldest + window)
    }

    /// Forget the history of one key.
    pub fn clear(&self, key: &str) {
        self.windows.lock().remove(key);
    }

    /// Forget every key.
    pub fn clear_all(&self) {
        self.windows.lock().clear();
    }
}

fn is_live(at: Instant, now: Instant, window: Duration) -> bool {
    now.saturating_duration_since(at) < window
}

fn live_count(timestamps: &VecDeque<Instant>, now: Instant, window: Duration) -> usize {
    timestamps.iter().filter(|&&at| is_live(at, now, window)).count()
}

// Timestamps are appended in order, so expired ones are always at the front.
fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while timestamps.front().is_some_and(|&at| !is_live(at, now, window)) {
        timestamps.pop_front();
    }
}
