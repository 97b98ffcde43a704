//! clarity-llm - Text-generation provider implementations for clarity.
//!
//! # Supported Providers
//!
//! - **Gemini** - `gemini-2.5-flash` and other Gemini models over REST
//!
//! The Claude providers are accepted in configuration but
//! [`LlmFactory::create`] rejects them as unsupported.
//!
//! # Example
//!
//! ```ignore
//! use clarity_llm::LlmFactory;
//!
//! // Reads GEMINI_API_KEY when the config carries no key
//! let llm = LlmFactory::gemini_with_model("gemini-2.5-flash")?;
//! ```

mod factory;
mod gemini;

pub use factory::LlmFactory;
pub use gemini::GeminiLlm;

// Re-export core types for convenience
pub use clarity_core::config::LlmProvider;
pub use clarity_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
