//! In-flight operation tracking.
//!
//! Controllers register a key before issuing a request and release it when the
//! completion message is handled. A key that is already registered refuses a
//! second start, so rapid repeated activation cannot issue overlapping writes
//! against the same favorite.

use std::collections::HashSet;
use std::hash::Hash;

/// Set of keys with an outstanding request.
#[derive(Debug, Clone)]
pub struct InFlight<K: Eq + Hash> {
    busy: HashSet<K>,
}

impl<K: Eq + Hash> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            busy: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash> InFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` busy. Returns false if it already was.
    pub fn try_start(&mut self, key: K) -> bool {
        self.busy.insert(key)
    }

    /// Release `key`. Returns false if it was not busy.
    pub fn finish(&mut self, key: &K) -> bool {
        self.busy.remove(key)
    }

    pub fn is_busy(&self, key: &K) -> bool {
        self.busy.contains(key)
    }

    pub fn is_idle(&self) -> bool {
        self.busy.is_empty()
    }

    /// Drop every registration (used on logout teardown).
    pub fn clear(&mut self) {
        self.busy.clear();
    }
}
