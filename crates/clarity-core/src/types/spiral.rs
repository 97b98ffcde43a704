//! Narrative input and reframe output records.

use serde::{Deserialize, Serialize};

use crate::config::LlmProvider;
use crate::error::{ClarityError, ClarityResult};

/// Lowest accepted certainty rating.
pub const MIN_CERTAINTY: u8 = 1;
/// Highest accepted certainty rating.
pub const MAX_CERTAINTY: u8 = 10;

/// A spiral captured from the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiralData {
    /// The anxious narrative, as written.
    pub narrative: String,
    /// How true it feels right now, 1 to 10.
    pub certainty: u8,
    /// What triggered it, if the user said.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl SpiralData {
    /// Create a validated spiral.
    pub fn new(narrative: impl Into<String>, certainty: u8) -> ClarityResult<Self> {
        let spiral = Self {
            narrative: narrative.into(),
            certainty,
            context: None,
        };
        spiral.validate()?;
        Ok(spiral)
    }

    /// Attach additional context. Blank context is dropped.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = if context.trim().is_empty() {
            None
        } else {
            Some(context)
        };
        self
    }

    /// Check the narrative is non-blank and certainty is in range.
    pub fn validate(&self) -> ClarityResult<()> {
        if self.narrative.trim().is_empty() {
            return Err(ClarityError::validation("Narrative must not be empty"));
        }
        if !(MIN_CERTAINTY..=MAX_CERTAINTY).contains(&self.certainty) {
            return Err(ClarityError::out_of_range(
                "certainty",
                format!(
                    "Certainty must be between {} and {}, got {}",
                    MIN_CERTAINTY, MAX_CERTAINTY, self.certainty
                ),
            ));
        }
        Ok(())
    }
}

/// Outcome of a reframe decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReframeResult {
    /// The reframe text.
    pub content: String,
    /// True when served from a stored pattern without generation.
    pub is_cache_hit: bool,
    /// Name of the pattern that produced a cache hit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_pattern_name: Option<String>,
    /// Score of the pattern that produced a cache hit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Citations: pattern sources on a hit, loaded context files otherwise.
    pub sources: Vec<String>,
    /// Generation provider, when generation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<LlmProvider>,
    /// Generation model, when generation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ReframeResult {
    /// Build a cache-hit result.
    pub fn cached(
        content: impl Into<String>,
        pattern_name: impl Into<String>,
        score: f64,
        sources: Vec<String>,
    ) -> Self {
        Self {
            content: content.into(),
            is_cache_hit: true,
            matched_pattern_name: Some(pattern_name.into()),
            score: Some(score),
            sources,
            provider: None,
            model: None,
        }
    }

    /// Build a generated result.
    pub fn generated(
        content: impl Into<String>,
        sources: Vec<String>,
        provider: Option<LlmProvider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            is_cache_hit: false,
            matched_pattern_name: None,
            score: None,
            sources,
            provider,
            model: Some(model.into()),
        }
    }
}
