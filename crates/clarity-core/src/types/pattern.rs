//! Pattern records and match results.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A named, recurring catastrophizing narrative with documented
/// counter-evidence.
///
/// Patterns are only ever produced by parsing the pattern document; each
/// load yields a fresh list that replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Identifying label, never empty.
    pub name: String,
    /// Lowercase trigger phrases, at least one, none empty.
    pub triggers: Vec<String>,
    /// Observed occurrence count, informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    /// Previously validated counter-narrative. May be empty.
    #[serde(default)]
    pub effective_reframe: String,
    /// Citation strings in document order.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Pattern {
    /// Create a pattern with the given name and triggers.
    ///
    /// Triggers are trimmed and lowercased; blank ones are dropped.
    pub fn new<I, S>(name: impl Into<String>, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            triggers: triggers
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            frequency: None,
            effective_reframe: String::new(),
            sources: Vec::new(),
        }
    }

    /// Set the effective reframe.
    pub fn with_reframe(mut self, reframe: impl Into<String>) -> Self {
        self.effective_reframe = reframe.into();
        self
    }

    /// Set the frequency.
    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Set the sources.
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// A pattern is usable only with a name and at least one trigger.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.triggers.is_empty()
    }
}

/// Result of scoring one narrative against one pattern.
///
/// Lives for a single matching call; the pattern itself is shared with the
/// cache rather than copied.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// The matched pattern.
    pub pattern: Arc<Pattern>,
    /// Match score in [0.5, 1.0].
    pub score: f64,
    /// Triggers that fired, in the pattern's trigger order.
    pub matched_triggers: Vec<String>,
}

impl PatternMatch {
    /// Name of the matched pattern.
    pub fn pattern_name(&self) -> &str {
        &self.pattern.name
    }

    /// Score rounded to a whole percentage, for display.
    pub fn percent(&self) -> u32 {
        (self.score * 100.0).round() as u32
    }

    /// Whether this match clears the given threshold (inclusive).
    pub fn meets(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}
