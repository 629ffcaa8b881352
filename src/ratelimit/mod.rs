//! Per-caller request rate limiting.
//!
//! The HTTP handler only depends on the `RateLimiter` trait so any
//! backing store can sit behind it. `FixedWindowLimiter` keeps
//! counters in process and is what `serve` uses.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Result of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, key: &str) -> RateDecision;
}

pub type BoxedRateLimiter = Box<dyn RateLimiter + Send + Sync + 'static>;

struct Window {
    started: Instant,
    count: u32,
}

/// Allows `limit` requests per key in each `period`.
pub struct FixedWindowLimiter {
    limit: u32,
    period: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, period: Duration) -> Self {
        Self {
            limit,
            period,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        // Expired windows are dropped so idle callers don't pile up
        windows.retain(|_, w| now.duration_since(w.started) < self.period);

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if window.count >= self.limit {
            return RateDecision { allowed: false };
        }
        window.count += 1;

        RateDecision { allowed: true }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }
}

/// Never denies. Used when rate limiting is turned off.
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn check(&self, _key: &str) -> RateDecision {
        RateDecision { allowed: true }
    }
}
