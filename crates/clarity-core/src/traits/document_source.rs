//! Document source trait and implementations.
//!
//! The engine reads the pattern document and context files through this
//! seam. "Not found" is an ordinary outcome (`Ok(None)`), distinct from a
//! read failure.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::error::ClarityResult;

/// Read access to user documents by vault-relative path.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Read a document as text. `Ok(None)` when it does not exist.
    async fn read_text(&self, path: &str) -> ClarityResult<Option<String>>;
}

/// Documents on the local filesystem, resolved against a root directory.
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    root: PathBuf,
}

impl FsDocumentSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn read_text(&self, path: &str) -> ClarityResult<Option<String>> {
        let full = self.resolve(path);
        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let content = tokio::fs::read_to_string(&full).await?;
        Ok(Some(content))
    }
}

/// Documents held in memory, keyed by path.
#[derive(Debug, Default)]
pub struct InMemoryDocumentSource {
    documents: RwLock<HashMap<String, String>>,
}

impl InMemoryDocumentSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source holding the given documents.
    pub fn with_documents<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            documents: RwLock::new(
                documents
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Insert or replace a document.
    pub async fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        self.documents
            .write()
            .await
            .insert(path.into(), content.into());
    }

    /// Remove a document.
    pub async fn remove(&self, path: &str) -> Option<String> {
        self.documents.write().await.remove(path)
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn read_text(&self, path: &str) -> ClarityResult<Option<String>> {
        Ok(self.documents.read().await.get(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_source_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Health")).unwrap();
        std::fs::write(dir.path().join("Health/Patterns.md"), "## Pattern: A").unwrap();

        let source = FsDocumentSource::new(dir.path());
        let content = source.read_text("Health/Patterns.md").await.unwrap();
        assert_eq!(content.as_deref(), Some("## Pattern: A"));
    }

    #[tokio::test]
    async fn test_fs_source_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsDocumentSource::new(dir.path());
        assert!(source.read_text("nope.md").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fs_source_directory_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Folder")).unwrap();
        let source = FsDocumentSource::new(dir.path());
        assert!(source.read_text("Folder").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_source() {
        let source = InMemoryDocumentSource::with_documents([("a.md", "alpha")]);
        assert_eq!(source.read_text("a.md").await.unwrap().as_deref(), Some("alpha"));

        source.insert("a.md", "beta").await;
        assert_eq!(source.read_text("a.md").await.unwrap().as_deref(), Some("beta"));

        source.remove("a.md").await;
        assert!(source.read_text("a.md").await.unwrap().is_none());
    }
}
