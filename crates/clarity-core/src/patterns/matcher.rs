//! Best-match selection over the cached pattern list.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::config::{PatternConfig, DEFAULT_CACHE_TTL_SECS};
use crate::events::{MatchObserver, TracingObserver};
use crate::patterns::cache::{PatternCache, PatternSet};
use crate::patterns::parser::parse_patterns;
use crate::patterns::scorer::score_pattern;
use crate::traits::DocumentSource;
use crate::types::PatternMatch;

/// Finds the pattern that best explains a narrative.
///
/// The pattern document is parsed on first use and re-parsed whenever the
/// cached list is older than the TTL or empty. A missing or unreadable
/// document means zero patterns, never an error.
pub struct PatternMatcher {
    source: Arc<dyn DocumentSource>,
    pattern_path: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn MatchObserver>,
    cache: RwLock<PatternCache>,
}

impl PatternMatcher {
    /// Create a matcher reading `pattern_path` from `source`.
    pub fn new(source: Arc<dyn DocumentSource>, pattern_path: impl Into<String>) -> Self {
        Self {
            source,
            pattern_path: pattern_path.into(),
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            clock: Arc::new(SystemClock),
            observer: Arc::new(TracingObserver),
            cache: RwLock::new(PatternCache::new()),
        }
    }

    /// Create a matcher from pattern configuration.
    pub fn from_config(source: Arc<dyn DocumentSource>, config: &PatternConfig) -> Self {
        Self::new(source, config.file_path.clone()).with_ttl(config.cache_ttl())
    }

    /// Set the cache freshness window.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the clock used for freshness checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the observer receiving load and match events.
    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Path of the pattern document.
    pub fn pattern_path(&self) -> &str {
        &self.pattern_path
    }

    /// Current pattern list, reloading it first if stale.
    pub async fn patterns(&self) -> PatternSet {
        let now = self.clock.now();
        {
            let cache = self.cache.read().await;
            if cache.is_fresh(now, self.ttl) {
                return cache.snapshot();
            }
        }

        let mut cache = self.cache.write().await;
        // Another caller may have reloaded while we waited for the lock.
        if cache.is_fresh(now, self.ttl) {
            return cache.snapshot();
        }

        match self.source.read_text(&self.pattern_path).await {
            Ok(Some(content)) => {
                let patterns = parse_patterns(&content, self.observer.as_ref());
                self.observer
                    .on_patterns_loaded(&self.pattern_path, patterns.len());
                cache.replace(patterns, now);
            }
            Ok(None) => {
                self.observer.on_source_unavailable(&self.pattern_path, None);
                cache.clear_patterns();
            }
            Err(e) => {
                self.observer
                    .on_source_unavailable(&self.pattern_path, Some(&e.to_string()));
                cache.clear_patterns();
            }
        }

        cache.snapshot()
    }

    /// Find the highest-scoring pattern for `narrative`.
    ///
    /// Ties go to the pattern that appears first in the document.
    pub async fn find_match(&self, narrative: &str) -> Option<PatternMatch> {
        let patterns = self.patterns().await;
        if patterns.is_empty() {
            self.observer.on_match_completed(None);
            return None;
        }

        let narrative_lower = narrative.to_lowercase();
        let mut best: Option<PatternMatch> = None;

        for pattern in patterns.iter() {
            let Some(candidate) = score_pattern(&narrative_lower, pattern) else {
                continue;
            };
            self.observer.on_match_scored(&candidate);

            let better = match &best {
                Some(current) => candidate.score > current.score,
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }

        self.observer.on_match_completed(best.as_ref());
        best
    }

    /// The pattern document exactly as stored, bypassing the cache.
    ///
    /// `None` when the document is missing or cannot be read.
    pub async fn raw_pattern_content(&self) -> Option<String> {
        match self.source.read_text(&self.pattern_path).await {
            Ok(Some(content)) => Some(content),
            Ok(None) => {
                self.observer.on_source_unavailable(&self.pattern_path, None);
                None
            }
            Err(e) => {
                self.observer
                    .on_source_unavailable(&self.pattern_path, Some(&e.to_string()));
                None
            }
        }
    }

    /// Whether any patterns are available, reloading first if stale.
    pub async fn has_patterns(&self) -> bool {
        !self.patterns().await.is_empty()
    }

    /// Drop the cached list so the next access re-parses the document.
    pub async fn invalidate(&self) {
        self.cache.write().await.invalidate();
    }
}
