//! Configuration system for clarity.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::{Display, EnumString};

use crate::error::{ClarityError, ClarityResult};
use crate::traits::LlmConfig;
use crate::types::PatternMode;

/// Default freshness window for the parsed pattern list.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;
/// Default score a match needs for a cache hit.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;
/// Default number of recent session-log entries included as context.
pub const DEFAULT_SESSION_COUNT: usize = 3;
/// Upper bound on session-log entries included as context.
pub const MAX_SESSION_COUNT: usize = 10;

/// Text-generation provider type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LlmProvider {
    #[default]
    Gemini,
    ClaudeSonnet,
    ClaudeHaiku,
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            config: LlmConfig {
                model: "gemini-2.5-flash".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Pattern matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// How patterns take part in a reframe.
    pub mode: PatternMode,
    /// Pattern document path, relative to the vault directory.
    pub file_path: String,
    /// Minimum score (inclusive, 0-1) for serving a stored reframe.
    pub match_threshold: f64,
    /// Seconds a parsed pattern list stays fresh.
    pub cache_ttl_secs: u64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            mode: PatternMode::Full,
            file_path: "Health/Mental Health/Clarity Patterns.md".to_string(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl PatternConfig {
    /// Freshness window as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Main clarity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarityConfig {
    /// Generation provider configuration.
    pub llm: LlmProviderConfig,
    /// Root directory all document paths are resolved against.
    pub vault_dir: PathBuf,
    /// Context documents sent along with every generation request.
    pub context_files: Vec<String>,
    /// Recent session-log entries to include.
    pub session_count: usize,
    /// Pattern matching configuration.
    pub patterns: PatternConfig,
}

impl Default for ClarityConfig {
    fn default() -> Self {
        let vault_dir = dirs::home_dir()
            .map(|h| h.join("Notes"))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            llm: LlmProviderConfig::default(),
            vault_dir,
            context_files: vec![
                "Health/Medical/Nuero-testing Results.md".to_string(),
                "Health/Mental Health/Session Log.md".to_string(),
                "Health/Mental Health/Shame Narrative Reframes - Daily Reminders.md".to_string(),
            ],
            session_count: DEFAULT_SESSION_COUNT,
            patterns: PatternConfig::default(),
        }
    }
}

impl ClarityConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> ClarityResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ClarityError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ClarityError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| ClarityError::Configuration(e.to_string()))?,
            _ => {
                return Err(ClarityError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables onto this configuration.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.llm.config.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("CLARITY_LLM_MODEL") {
            self.llm.config.model = model;
        }
        if let Ok(provider) = std::env::var("CLARITY_LLM_PROVIDER") {
            match provider.parse() {
                Ok(p) => self.llm.provider = p,
                Err(_) => tracing::warn!("Ignoring unknown CLARITY_LLM_PROVIDER '{}'", provider),
            }
        }
        if let Ok(dir) = std::env::var("CLARITY_VAULT_DIR") {
            self.vault_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("CLARITY_PATTERN_FILE") {
            self.patterns.file_path = path;
        }
        if let Ok(mode) = std::env::var("CLARITY_PATTERN_MODE") {
            match mode.parse() {
                Ok(m) => self.patterns.mode = m,
                Err(_) => tracing::warn!("Ignoring unknown CLARITY_PATTERN_MODE '{}'", mode),
            }
        }
        if let Ok(threshold) = std::env::var("CLARITY_MATCH_THRESHOLD") {
            match threshold.parse() {
                Ok(t) => self.patterns.match_threshold = t,
                Err(_) => {
                    tracing::warn!("Ignoring invalid CLARITY_MATCH_THRESHOLD '{}'", threshold)
                }
            }
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> ClarityResult<()> {
        let threshold = self.patterns.match_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ClarityError::out_of_range(
                "patterns.match_threshold",
                format!("Match threshold must be between 0 and 1, got {}", threshold),
            ));
        }
        let sessions = self.session_count;
        if !(1..=MAX_SESSION_COUNT).contains(&sessions) {
            return Err(ClarityError::out_of_range(
                "session_count",
                format!(
                    "Session count must be between 1 and {}, got {}",
                    MAX_SESSION_COUNT, sessions
                ),
            ));
        }
        if self.patterns.mode != PatternMode::Off && self.patterns.file_path.trim().is_empty() {
            return Err(ClarityError::validation(
                "Pattern file path must be set unless pattern mode is off",
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> ClarityConfigBuilder {
        ClarityConfigBuilder::default()
    }
}

/// Builder for ClarityConfig.
#[derive(Default)]
pub struct ClarityConfigBuilder {
    config: ClarityConfig,
}

impl ClarityConfigBuilder {
    /// Set generation provider configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Set the vault directory.
    pub fn vault_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.vault_dir = dir.into();
        self
    }

    /// Set the context documents.
    pub fn context_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.context_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of session-log entries to include.
    pub fn session_count(mut self, count: usize) -> Self {
        self.config.session_count = count;
        self
    }

    /// Set the pattern mode.
    pub fn pattern_mode(mut self, mode: PatternMode) -> Self {
        self.config.patterns.mode = mode;
        self
    }

    /// Set the pattern document path.
    pub fn pattern_file(mut self, path: impl Into<String>) -> Self {
        self.config.patterns.file_path = path.into();
        self
    }

    /// Set the match threshold.
    pub fn match_threshold(mut self, threshold: f64) -> Self {
        self.config.patterns.match_threshold = threshold;
        self
    }

    /// Set the pattern cache freshness window.
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.config.patterns.cache_ttl_secs = secs;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> ClarityResult<ClarityConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClarityConfig::default();
        assert_eq!(config.patterns.mode, PatternMode::Full);
        assert!((config.patterns.match_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.patterns.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.session_count, 3);
        assert_eq!(config.llm.provider, LlmProvider::Gemini);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_out_of_range_threshold() {
        assert!(ClarityConfig::builder().match_threshold(1.5).build().is_err());
        assert!(ClarityConfig::builder().match_threshold(-0.1).build().is_err());
        assert!(ClarityConfig::builder().match_threshold(1.0).build().is_ok());
    }

    #[test]
    fn test_builder_rejects_bad_session_count() {
        assert!(ClarityConfig::builder().session_count(0).build().is_err());
        assert!(ClarityConfig::builder().session_count(11).build().is_err());
    }

    #[test]
    fn test_off_mode_allows_blank_pattern_file() {
        let config = ClarityConfig::builder()
            .pattern_mode(PatternMode::Off)
            .pattern_file("")
            .build();
        assert!(config.is_ok());
        assert!(ClarityConfig::builder().pattern_file(" ").build().is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
vault_dir = "/tmp/vault"
context_files = ["a.md"]

[llm]
provider = "gemini"
model = "gemini-2.5-pro"

[patterns]
mode = "patterns-api"
match_threshold = 0.5
"#
        )
        .unwrap();

        let config = ClarityConfig::from_file(file.path()).unwrap();
        assert_eq!(config.vault_dir, PathBuf::from("/tmp/vault"));
        assert_eq!(config.context_files, vec!["a.md"]);
        assert_eq!(config.llm.config.model, "gemini-2.5-pro");
        assert_eq!(config.patterns.mode, PatternMode::PatternsApi);
        assert!((config.patterns.match_threshold - 0.5).abs() < f64::EPSILON);
        // Unset fields keep their defaults
        assert_eq!(config.patterns.cache_ttl_secs, 60);
        assert_eq!(config.session_count, 3);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "patterns:\n  mode: \"off\"\n  file_path: \"\"").unwrap();

        let config = ClarityConfig::from_file(file.path()).unwrap();
        assert_eq!(config.patterns.mode, PatternMode::Off);
    }

    #[test]
    fn test_from_file_validates() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"patterns": {{"match_threshold": 3.0}}}}"#).unwrap();
        assert!(ClarityConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ClarityConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ClarityError::Configuration(_)));
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(LlmProvider::ClaudeSonnet.to_string(), "claude-sonnet");
        assert_eq!("claude-haiku".parse::<LlmProvider>().unwrap(), LlmProvider::ClaudeHaiku);
    }
}
