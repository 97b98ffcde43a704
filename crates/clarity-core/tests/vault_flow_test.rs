//! Integration tests for the reframe flow over a vault on disk.

use async_trait::async_trait;
use clarity_core::{
    parse_patterns, ClarityConfig, ClarityResult, FsDocumentSource, GenerationOptions, Llm,
    LlmProvider, LlmResponse, Message, MessageRole, NoopObserver, PatternMode,
    ReframeDecisionFlow, SpiralData,
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

const PATTERN_FILE: &str = "Health/Mental Health/Clarity Patterns.md";
const SESSION_LOG: &str = "Health/Mental Health/Session Log.md";

const PATTERNS: &str = "# Clarity Patterns

Patterns noticed across sessions.

## Pattern: Rejection Spiral
- **Triggers:** worthless, nobody likes me
- **Frequency:** 12 times
- **Sources:** Journal/2024-03.md
- **Effective Reframe:**
> You have three close friends who messaged you this week.

## Pattern: Unfinished
- **Frequency:** 2

## Pattern: Work Catastrophe
- **Triggers:** fired, incompetent
- **Effective Reframe:**
> Your last review said you exceed expectations.
";

const SESSIONS: &str = "# Session Log

## 2024-03-01
Early session.

## 2024-03-08
Middle session.

## 2024-03-15
Latest session.
";

/// Records every request and answers with a fixed reply.
#[derive(Default)]
struct RecordingLlm {
    requests: Mutex<Vec<Vec<Message>>>,
}

impl RecordingLlm {
    fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Llm for RecordingLlm {
    async fn generate(
        &self,
        messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> ClarityResult<LlmResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        Ok(LlmResponse::text(
            "**EVIDENCE AGAINST THIS NARRATIVE:**\n1. ...\n\n**WHAT'S ACTUALLY TRUE:** ...",
        ))
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn vault() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), PATTERN_FILE, PATTERNS);
    write(dir.path(), SESSION_LOG, SESSIONS);
    dir
}

fn config(vault: &Path) -> ClarityConfig {
    ClarityConfig::builder()
        .vault_dir(vault)
        .context_files([SESSION_LOG, "Health/Missing.md"])
        .session_count(2)
        .match_threshold(0.7)
        .build()
        .unwrap()
}

fn flow(vault: &Path, llm: Arc<RecordingLlm>) -> ReframeDecisionFlow {
    let config = config(vault);
    let source = Arc::new(FsDocumentSource::new(&config.vault_dir));
    ReframeDecisionFlow::from_config(source, &config).with_llm(llm, LlmProvider::Gemini)
}

#[tokio::test]
async fn test_cache_hit_served_from_disk() {
    let dir = vault();
    let llm = Arc::new(RecordingLlm::default());
    let flow = flow(dir.path(), llm.clone());

    let spiral = SpiralData::new("I feel worthless and nobody likes me", 9).unwrap();
    let result = flow.decide(&spiral, PatternMode::Full, 0.5).await.unwrap();

    assert!(result.is_cache_hit);
    assert_eq!(
        result.content,
        "You have three close friends who messaged you this week."
    );
    assert_eq!(result.matched_pattern_name.as_deref(), Some("Rejection Spiral"));
    assert_eq!(result.score, Some(0.6));
    assert_eq!(result.sources, vec!["Journal/2024-03.md"]);
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_below_threshold_generates_with_enriched_context() {
    let dir = vault();
    let llm = Arc::new(RecordingLlm::default());
    let flow = flow(dir.path(), llm.clone());

    // Scores 0.6 against the configured 0.7 threshold
    let spiral = SpiralData::new("I feel worthless and nobody likes me", 9)
        .unwrap()
        .with_context("Friend cancelled plans");
    let result = flow.reframe(&spiral).await.unwrap();

    assert!(!result.is_cache_hit);
    assert_eq!(result.sources, vec![SESSION_LOG, PATTERN_FILE]);
    assert_eq!(result.provider, Some(LlmProvider::Gemini));
    assert_eq!(result.model.as_deref(), Some("recording"));

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let system = &requests[0][0];
    let user = &requests[0][1];

    assert_eq!(system.role, MessageRole::System);
    assert!(system.content.contains("### Session Log.md"));
    assert!(system.content.contains("## 2024-03-08"));
    assert!(system.content.contains("## 2024-03-15"));
    assert!(!system.content.contains("2024-03-01"));
    assert!(system.content.contains(&format!(
        "### Known Patterns\n(Source: {})\n\n{}",
        PATTERN_FILE, PATTERNS
    )));

    assert_eq!(user.role, MessageRole::User);
    assert!(user.content.starts_with("SPIRAL: I feel worthless and nobody likes me"));
    assert!(user.content.contains("CERTAINTY: 9/10"));
    assert!(user.content.contains("ADDITIONAL CONTEXT: Friend cancelled plans"));
}

#[tokio::test]
async fn test_missing_pattern_file_degrades_to_generation() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), SESSION_LOG, SESSIONS);
    let llm = Arc::new(RecordingLlm::default());
    let flow = flow(dir.path(), llm.clone());

    let spiral = SpiralData::new("I feel worthless", 5).unwrap();
    let result = flow.reframe(&spiral).await.unwrap();

    assert!(!result.is_cache_hit);
    assert_eq!(result.sources, vec![SESSION_LOG]);
    assert!(!flow.matcher().has_patterns().await);
    assert_eq!(llm.requests().len(), 1);
}

#[tokio::test]
async fn test_matcher_reports_parsed_patterns() {
    let dir = vault();
    let flow = flow(dir.path(), Arc::new(RecordingLlm::default()));

    let patterns = flow.matcher().patterns().await;
    let names: Vec<&str> = patterns.iter().map(|p| p.name.as_str()).collect();

    // "Unfinished" has no triggers and is left out
    assert_eq!(names, vec!["Rejection Spiral", "Work Catastrophe"]);
    assert!(patterns.iter().all(|p| !p.triggers.is_empty()));
    assert_eq!(patterns[0].frequency, Some(12));
}

#[test]
fn test_parsing_file_contents_is_idempotent() {
    let dir = vault();
    let raw = fs::read_to_string(dir.path().join(PATTERN_FILE)).unwrap();
    assert_eq!(
        parse_patterns(&raw, &NoopObserver),
        parse_patterns(&raw, &NoopObserver)
    );
}

#[tokio::test]
async fn test_flow_from_config_file() {
    let dir = vault();
    let config_path = dir.path().join("clarity.toml");
    fs::write(
        &config_path,
        format!(
            r#"
vault_dir = "{}"
context_files = []

[patterns]
mode = "off"
"#,
            dir.path().display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();

    let config = ClarityConfig::from_file(&config_path).unwrap();
    assert_eq!(config.patterns.mode, PatternMode::Off);

    let llm = Arc::new(RecordingLlm::default());
    let source = Arc::new(FsDocumentSource::new(&config.vault_dir));
    let flow = ReframeDecisionFlow::from_config(source, &config)
        .with_llm(llm.clone(), config.llm.provider);

    let spiral = SpiralData::new("I feel worthless and nobody likes me", 9).unwrap();
    let result = flow.reframe(&spiral).await.unwrap();

    assert!(!result.is_cache_hit);
    assert!(result.sources.is_empty());
    assert!(!llm.requests()[0][0].content.contains("### Known Patterns"));
}
