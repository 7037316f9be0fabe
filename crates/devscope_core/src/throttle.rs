//! Publish Throttle
//!
//! Bounds how often spectra reach the consumer, independent of how fast the
//! capture callback fires. Excess candidates are dropped, never queued: the
//! next accepted spectrum always supersedes whatever was skipped.

use std::time::{Duration, Instant};

/// Drop-based rate limiter keyed on the last accepted timestamp
#[derive(Debug, Clone)]
pub struct PublishThrottle {
    min_interval: Duration,
    last_publish: Option<Instant>,
}

impl PublishThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_publish: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn last_publish(&self) -> Option<Instant> {
        self.last_publish
    }

    /// Whether a candidate arriving at `now` would be forwarded
    #[inline]
    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_publish {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        }
    }

    /// Accept the candidate at `now` if the interval has elapsed
    ///
    /// Returns true (and records `now`) when the candidate should be published.
    #[inline]
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if !self.is_ready(now) {
            return false;
        }
        self.last_publish = Some(now);
        true
    }
}
