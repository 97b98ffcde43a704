//! Loading the user's documented records as generation context.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{ClarityConfig, DEFAULT_SESSION_COUNT};
use crate::traits::DocumentSource;

/// Separator placed between context sections.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

const SESSION_LOG_MARKER: &str = "session log";
const SESSION_HEADER: &str = "## ";

/// Context assembled from the configured files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedContext {
    /// Every loaded file, formatted and joined.
    pub full_context: String,
    /// Paths that contributed, in load order.
    pub sources: Vec<String>,
}

impl LoadedContext {
    /// Whether nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Append a section for `path`, keeping the separator convention.
    pub fn push_section(&mut self, path: &str, content: &str) {
        if !self.full_context.is_empty() {
            self.full_context.push_str(SECTION_SEPARATOR);
        }
        self.full_context.push_str(&format_section(path, content));
        self.sources.push(path.to_string());
    }
}

/// Reads context files through a [`DocumentSource`].
pub struct ContextLoader {
    source: Arc<dyn DocumentSource>,
    context_files: Vec<String>,
    session_count: usize,
}

impl ContextLoader {
    /// Create a loader for `context_files`.
    pub fn new(source: Arc<dyn DocumentSource>, context_files: Vec<String>) -> Self {
        Self {
            source,
            context_files,
            session_count: DEFAULT_SESSION_COUNT,
        }
    }

    /// Create a loader from configuration.
    pub fn from_config(source: Arc<dyn DocumentSource>, config: &ClarityConfig) -> Self {
        Self::new(source, config.context_files.clone()).with_session_count(config.session_count)
    }

    /// Number of most recent sessions kept from session logs.
    pub fn with_session_count(mut self, count: usize) -> Self {
        self.session_count = count;
        self
    }

    /// Load every configured file that can be read.
    ///
    /// Missing and unreadable files are skipped; loading never fails.
    pub async fn load_context(&self) -> LoadedContext {
        let mut loaded = LoadedContext::default();

        for path in &self.context_files {
            if path.trim().is_empty() {
                continue;
            }

            match self.source.read_text(path).await {
                Ok(Some(content)) => {
                    let content = if is_session_log(path) {
                        extract_recent_sessions(&content, self.session_count)
                    } else {
                        &content
                    };
                    debug!(path = %path, bytes = content.len(), "Loaded context file");
                    loaded.push_section(path, content);
                }
                Ok(None) => warn!(path = %path, "Context file not found"),
                Err(e) => warn!(path = %path, error = %e, "Could not load context file"),
            }
        }

        if loaded.is_empty() {
            warn!("No context files could be loaded, reframe may be less accurate");
        }

        loaded
    }
}

fn is_session_log(path: &str) -> bool {
    path.to_lowercase().contains(SESSION_LOG_MARKER)
}

/// Keep the last `session_count` sessions of a session log.
///
/// Sessions start at lines beginning with `## ` followed by a title. The
/// result runs from the first kept header to the end of the file. Content
/// without any session header is returned whole.
pub fn extract_recent_sessions(content: &str, session_count: usize) -> &str {
    let mut offset = 0;
    let mut starts = Vec::new();

    for line in content.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\r', '\n']);
        if bare
            .strip_prefix(SESSION_HEADER)
            .is_some_and(|title| !title.is_empty())
        {
            starts.push(offset);
        }
        offset += line.len();
    }

    let first = starts.len().saturating_sub(session_count);
    match starts.get(first) {
        Some(&start) => &content[start..],
        None => content,
    }
}

/// Format one context section with its file name and source path.
pub fn format_section(path: &str, content: &str) -> String {
    let file_name = match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => path,
    };
    format!("### {}\n(Source: {})\n\n{}", file_name, path, content)
}
