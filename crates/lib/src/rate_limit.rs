//! # Request Throttling
//!
//! A per-key request quota, injected into the calling layer as a
//! [`RateLimiter`]. The generation pipeline itself never consults it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// The result of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests still allowed in the current window after this one.
    pub remaining: u32,
}

/// A gate that decides whether a request identified by `key` may proceed.
pub trait RateLimiter: Send + Sync + Debug {
    /// Counts one request against `key` and reports whether it is allowed.
    fn check(&self, key: &str) -> RateLimitDecision;

    /// Drops state that can no longer affect a decision. The default does nothing.
    fn prune(&self) {}
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// Allows `max_requests` per key in each fixed window of length `window`.
///
/// A key's window starts with its first request and is reset by the first
/// request after it expires.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Checks `key` as of `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            resets_at: now + self.window,
        });
        if now > window.resets_at {
            *window = Window {
                count: 0,
                resets_at: now + self.window,
            };
        }

        if window.count >= self.max_requests {
            debug!(%key, "Rate limit exceeded.");
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
            };
        }

        window.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - window.count,
        }
    }

    /// Drops every window that has expired as of `now`.
    pub fn prune_at(&self, now: Instant) {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|_, window| now <= window.resets_at);
    }

    /// The number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    fn prune(&self) {
        self.prune_at(Instant::now());
    }
}
