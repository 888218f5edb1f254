// src/executor/rate_limit.rs

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window call limiter, keyed per language.
///
/// Process-wide state with no cross-process coordination; an explicit
/// component (rather than hidden module state) so tests can construct and
/// reset their own instance.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_calls: usize,
    calls: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_calls_per_window: usize, window: Duration) -> Self {
        Self {
            window,
            max_calls: max_calls_per_window,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// 60 calls per minute per language.
    pub fn per_minute(max_calls: usize) -> Self {
        Self::new(max_calls, Duration::from_secs(60))
    }

    /// Records one call for `key` if the window has room. Returns false when
    /// the limit is exhausted; the caller must not proceed.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut calls = self.calls.lock().expect("rate limiter lock poisoned");
        let window = calls.entry(key.to_string()).or_default();

        while let Some(front) = window.front() {
            if now.duration_since(*front) >= self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.max_calls {
            return false;
        }
        window.push_back(now);
        true
    }
}
