//! Time-bounded cache of the parsed pattern list.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::types::Pattern;

/// Shared, immutable snapshot of the loaded patterns.
pub type PatternSet = Arc<Vec<Arc<Pattern>>>;

/// Parsed patterns plus the time they were loaded.
///
/// The list is replaced wholesale, never edited, so a reader holding a
/// snapshot keeps a consistent view across a reload.
#[derive(Debug, Clone, Default)]
pub struct PatternCache {
    patterns: PatternSet,
    loaded_at: Option<DateTime<Utc>>,
}

impl PatternCache {
    /// An empty, stale cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cache can be served at `now`.
    ///
    /// An empty cache is never fresh, whatever its age.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let Some(loaded_at) = self.loaded_at else {
            return false;
        };
        if self.patterns.is_empty() {
            return false;
        }
        match (now - loaded_at).to_std() {
            Ok(age) => age < ttl,
            // loaded in the future: the clock went backwards
            Err(_) => false,
        }
    }

    /// Swap in a freshly loaded list.
    pub fn replace(&mut self, patterns: Vec<Pattern>, now: DateTime<Utc>) {
        self.patterns = Arc::new(patterns.into_iter().map(Arc::new).collect());
        self.loaded_at = Some(now);
    }

    /// Drop to an empty list, keeping the last load time.
    pub fn clear_patterns(&mut self) {
        self.patterns = Arc::new(Vec::new());
    }

    /// Forget everything so the next access reloads.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> PatternSet {
        Arc::clone(&self.patterns)
    }

    /// Number of cached patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the cache holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// When the cache was last filled.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}
