//! Observer trait and stock implementations.

use std::fmt;
use std::sync::Mutex;

use crate::types::PatternMatch;

/// Why a pattern block was dropped during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The block's first line was blank.
    MissingName,
    /// No non-blank trigger was found.
    NoTriggers,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingName => write!(f, "missing name"),
            SkipReason::NoTriggers => write!(f, "no triggers"),
        }
    }
}

/// Receives diagnostic events. Every method defaults to doing nothing.
pub trait MatchObserver: Send + Sync {
    /// A pattern block was skipped. `block_index` counts blocks from zero.
    fn on_pattern_skipped(&self, _block_index: usize, _name: &str, _reason: SkipReason) {}

    /// The pattern document was parsed.
    fn on_patterns_loaded(&self, _path: &str, _count: usize) {}

    /// The pattern document could not be read; `error` is `None` when it
    /// simply does not exist.
    fn on_source_unavailable(&self, _path: &str, _error: Option<&str>) {}

    /// A pattern matched the narrative.
    fn on_match_scored(&self, _candidate: &PatternMatch) {}

    /// A `find_match` call finished.
    fn on_match_completed(&self, _best: Option<&PatternMatch>) {}
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MatchObserver for NoopObserver {}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn on_pattern_skipped(&self, block_index: usize, name: &str, reason: SkipReason) {
        tracing::warn!(block_index, name, %reason, "Skipping pattern block");
    }

    fn on_patterns_loaded(&self, path: &str, count: usize) {
        tracing::info!(path, count, "Loaded {} patterns", count);
    }

    fn on_source_unavailable(&self, path: &str, error: Option<&str>) {
        match error {
            Some(error) => tracing::error!(path, error, "Failed to load patterns"),
            None => tracing::info!(path, "Pattern file not found"),
        }
    }

    fn on_match_scored(&self, candidate: &PatternMatch) {
        tracing::debug!(
            pattern = %candidate.pattern.name,
            triggers = ?candidate.matched_triggers,
            "Pattern matched {} triggers = {}%",
            candidate.matched_triggers.len(),
            candidate.percent()
        );
    }

    fn on_match_completed(&self, best: Option<&PatternMatch>) {
        match best {
            Some(m) => tracing::debug!(pattern = %m.pattern.name, score = m.score, "Best match"),
            None => tracing::debug!("No pattern matched"),
        }
    }
}

/// A recorded observer event.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    PatternSkipped {
        block_index: usize,
        name: String,
        reason: SkipReason,
    },
    PatternsLoaded {
        path: String,
        count: usize,
    },
    SourceUnavailable {
        path: String,
        error: Option<String>,
    },
    MatchScored {
        pattern: String,
        score: f64,
    },
    MatchCompleted {
        best: Option<String>,
    },
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<MatchEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events, oldest first.
    pub fn events(&self) -> Vec<MatchEvent> {
        self.lock().clone()
    }

    /// Number of completed `find_match` calls seen.
    pub fn match_calls(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, MatchEvent::MatchCompleted { .. }))
            .count()
    }

    /// Number of successful document loads seen.
    pub fn loads(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, MatchEvent::PatternsLoaded { .. }))
            .count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, event: MatchEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MatchEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MatchObserver for RecordingObserver {
    fn on_pattern_skipped(&self, block_index: usize, name: &str, reason: SkipReason) {
        self.push(MatchEvent::PatternSkipped {
            block_index,
            name: name.to_string(),
            reason,
        });
    }

    fn on_patterns_loaded(&self, path: &str, count: usize) {
        self.push(MatchEvent::PatternsLoaded {
            path: path.to_string(),
            count,
        });
    }

    fn on_source_unavailable(&self, path: &str, error: Option<&str>) {
        self.push(MatchEvent::SourceUnavailable {
            path: path.to_string(),
            error: error.map(str::to_string),
        });
    }

    fn on_match_scored(&self, candidate: &PatternMatch) {
        self.push(MatchEvent::MatchScored {
            pattern: candidate.pattern.name.clone(),
            score: candidate.score,
        });
    }

    fn on_match_completed(&self, best: Option<&PatternMatch>) {
        self.push(MatchEvent::MatchCompleted {
            best: best.map(|m| m.pattern.name.clone()),
        });
    }
}
