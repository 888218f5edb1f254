// src/executor/cache.rs

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::ExecutionOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    language: String,
    code: String,
    stdin: String,
}

/// Bounded memo of execution outcomes keyed by (language, code, stdin).
/// Insertion-order eviction once `capacity` entries exist.
///
/// Known limitation: a cached outcome can mask programs whose output depends
/// on external state (wall clock, randomness). The client constructs this
/// only when caching is enabled in config.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, ExecutionOutcome>,
    order: VecDeque<CacheKey>,
}

impl ResultCache {
    pub const DEFAULT_CAPACITY: usize = 128;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, language: &str, code: &str, stdin: &str) -> Option<ExecutionOutcome> {
        let key = CacheKey {
            language: language.to_string(),
            code: code.to_string(),
            stdin: stdin.to_string(),
        };
        let inner = self.inner.lock().expect("result cache lock poisoned");
        inner.entries.get(&key).cloned()
    }

    pub fn insert(&self, language: &str, code: &str, stdin: &str, outcome: ExecutionOutcome) {
        let key = CacheKey {
            language: language.to_string(),
            code: code.to_string(),
            stdin: stdin.to_string(),
        };
        let mut inner = self.inner.lock().expect("result cache lock poisoned");
        if inner.entries.contains_key(&key) {
            inner.entries.insert(key, outcome);
            return;
        }
        if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, outcome);
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
