//! Factory for creating text-generation providers.

use std::sync::Arc;

use clarity_core::config::{LlmProvider, LlmProviderConfig};
use clarity_core::error::{ClarityError, ClarityResult};
use clarity_core::traits::{Llm, LlmConfig};

use crate::gemini::GeminiLlm;

/// Factory for creating text-generation providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create a provider from the given configuration.
    ///
    /// Only Gemini is implemented; the Claude providers are recognised in
    /// configuration but rejected here.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> ClarityResult<Arc<dyn Llm>> {
        match provider {
            LlmProvider::Gemini => {
                let llm = GeminiLlm::new(config)?;
                Ok(Arc::new(llm))
            }
            LlmProvider::ClaudeSonnet | LlmProvider::ClaudeHaiku => {
                Err(ClarityError::UnsupportedProvider {
                    provider: provider.to_string(),
                })
            }
        }
    }

    /// Create the provider described by a provider configuration.
    pub fn from_config(config: &LlmProviderConfig) -> ClarityResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Create a Gemini provider with a specific model.
    pub fn gemini_with_model(model: impl Into<String>) -> ClarityResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Gemini, config)
    }
}
