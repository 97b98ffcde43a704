//! Decides whether a spiral is answered from a stored pattern reframe or
//! by generating a fresh one.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{ClarityConfig, LlmProvider, PatternConfig};
use crate::context::{ContextLoader, LoadedContext, SECTION_SEPARATOR};
use crate::error::{ClarityError, ClarityResult};
use crate::patterns::PatternMatcher;
use crate::prompts::PromptBuilder;
use crate::traits::{DocumentSource, GenerationOptions, Llm};
use crate::types::{PatternMatch, PatternMode, ReframeResult, SpiralData};

/// Heading of the section carrying the raw pattern document.
pub const KNOWN_PATTERNS_HEADING: &str = "### Known Patterns";

/// Chooses between a cached reframe and a generated one.
pub struct ReframeDecisionFlow {
    matcher: Arc<PatternMatcher>,
    context_loader: ContextLoader,
    prompts: PromptBuilder,
    llm: Option<Arc<dyn Llm>>,
    provider: Option<LlmProvider>,
    options: Option<GenerationOptions>,
    mode: PatternMode,
    threshold: f64,
}

impl ReframeDecisionFlow {
    /// Create a flow with default mode and threshold and no generation client.
    pub fn new(matcher: Arc<PatternMatcher>, context_loader: ContextLoader) -> Self {
        let defaults = PatternConfig::default();
        Self {
            matcher,
            context_loader,
            prompts: PromptBuilder::new(),
            llm: None,
            provider: None,
            options: None,
            mode: defaults.mode,
            threshold: defaults.match_threshold,
        }
    }

    /// Wire the matcher and context loader from configuration.
    pub fn from_config(source: Arc<dyn DocumentSource>, config: &ClarityConfig) -> Self {
        let matcher = Arc::new(PatternMatcher::from_config(
            Arc::clone(&source),
            &config.patterns,
        ));
        let context_loader = ContextLoader::from_config(source, config);

        Self::new(matcher, context_loader)
            .with_mode(config.patterns.mode)
            .with_threshold(config.patterns.match_threshold)
            .with_options(GenerationOptions {
                temperature: Some(config.llm.config.temperature),
                max_tokens: Some(config.llm.config.max_tokens),
            })
    }

    /// Set the generation client and the provider it belongs to.
    pub fn with_llm(mut self, llm: Arc<dyn Llm>, provider: LlmProvider) -> Self {
        self.llm = Some(llm);
        self.provider = Some(provider);
        self
    }

    /// Set the default pattern mode.
    pub fn with_mode(mut self, mode: PatternMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the default match threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set per-call generation options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// The pattern matcher.
    pub fn matcher(&self) -> &Arc<PatternMatcher> {
        &self.matcher
    }

    /// Default pattern mode.
    pub fn mode(&self) -> PatternMode {
        self.mode
    }

    /// Default match threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Decide with the configured mode and threshold.
    pub async fn reframe(&self, spiral: &SpiralData) -> ClarityResult<ReframeResult> {
        self.decide(spiral, self.mode, self.threshold).await
    }

    /// Produce a reframe for `spiral`.
    ///
    /// In `full` mode a match scoring at least `threshold` is served from its
    /// stored reframe without generation. Every other path generates, with
    /// the raw pattern document as extra context unless the mode is `off`.
    /// Generation errors propagate unchanged.
    pub async fn decide(
        &self,
        spiral: &SpiralData,
        mode: PatternMode,
        threshold: f64,
    ) -> ClarityResult<ReframeResult> {
        spiral.validate()?;

        if mode.uses_matching() {
            match self.matcher.find_match(&spiral.narrative).await {
                Some(m) if m.meets(threshold) => return Ok(self.cache_hit(&m)),
                Some(m) => debug!(
                    pattern = %m.pattern_name(),
                    score = m.score,
                    threshold,
                    "Best match below threshold"
                ),
                None => debug!("No pattern matched"),
            }
        }

        self.generate(spiral, mode.enriches_context()).await
    }

    fn cache_hit(&self, m: &PatternMatch) -> ReframeResult {
        info!(
            pattern = %m.pattern_name(),
            score = m.score,
            "Serving stored reframe"
        );
        ReframeResult::cached(
            m.pattern.effective_reframe.clone(),
            m.pattern.name.clone(),
            m.score,
            m.pattern.sources.clone(),
        )
    }

    async fn generate(&self, spiral: &SpiralData, enrich: bool) -> ClarityResult<ReframeResult> {
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| ClarityError::not_initialized("Generation service not initialized"))?;

        let mut context = self.context_loader.load_context().await;
        if enrich {
            self.enrich(&mut context).await;
        }

        let messages = self.prompts.build_messages(&context.full_context, spiral);
        let response = llm.generate(&messages, self.options.clone()).await?;

        let content = match response.content {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(ClarityError::empty_response(llm.model_name())),
        };

        info!(
            model = llm.model_name(),
            sources = context.sources.len(),
            "Generated reframe"
        );
        Ok(ReframeResult::generated(
            content,
            context.sources,
            self.provider,
            llm.model_name(),
        ))
    }

    /// Append the raw pattern document. Skipped silently when unavailable.
    async fn enrich(&self, context: &mut LoadedContext) {
        let Some(raw) = self.matcher.raw_pattern_content().await else {
            debug!("Pattern document unavailable, generating without it");
            return;
        };

        append_known_patterns(context, self.matcher.pattern_path(), &raw);
    }
}

fn append_known_patterns(context: &mut LoadedContext, path: &str, raw: &str) {
    if !context.full_context.is_empty() {
        context.full_context.push_str(SECTION_SEPARATOR);
    }
    context.full_context.push_str(&format!(
        "{}\n(Source: {})\n\n{}",
        KNOWN_PATTERNS_HEADING, path, raw
    ));
    context.sources.push(path.to_string());
}
