//! clarity-core - Core library for clarity.
//!
//! This crate parses a personal pattern document into behavioral patterns,
//! scores anxious narratives against them, and decides whether a stored
//! reframe can be served or a fresh one must be generated.
//!
//! # Example
//!
//! ```ignore
//! use clarity_core::{ClarityConfig, FsDocumentSource, ReframeDecisionFlow, SpiralData};
//!
//! let config = ClarityConfig::from_env();
//! let source = Arc::new(FsDocumentSource::new(&config.vault_dir));
//! let flow = ReframeDecisionFlow::from_config(source, &config).with_llm(llm, config.llm.provider);
//!
//! let spiral = SpiralData::new("I feel worthless and nobody likes me", 8)?;
//! let result = flow.reframe(&spiral).await?;
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod patterns;
pub mod prompts;
pub mod reframe;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClarityConfig, LlmProvider, LlmProviderConfig, PatternConfig};
pub use context::{ContextLoader, LoadedContext};
pub use error::{ClarityError, ClarityResult, ErrorCode};
pub use events::{MatchEvent, MatchObserver, NoopObserver, RecordingObserver, TracingObserver};
pub use patterns::{parse_patterns, PatternMatcher};
pub use prompts::PromptBuilder;
pub use reframe::ReframeDecisionFlow;
pub use traits::{
    DocumentSource, FsDocumentSource, GenerationOptions, InMemoryDocumentSource, Llm, LlmConfig,
    LlmResponse,
};
pub use types::{
    Message, MessageRole, Pattern, PatternMatch, PatternMode, ReframeResult, SpiralData,
};
