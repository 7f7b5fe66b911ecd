//! Local text file source.

use super::{Document, Source, SourceKind};
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Supported text file extensions.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

/// Local text file source, for transcripts and articles saved to disk.
pub struct FileSource;

impl FileSource {
    pub fn new() -> Self {
        Self
    }

    fn is_text_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn resolve(input: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(input.trim()).to_string())
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for FileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn can_handle(&self, input: &str) -> bool {
        let path = Self::resolve(input);
        path.is_file() && Self::is_text_file(&path)
    }

    async fn fetch(&self, input: &str) -> Result<Document> {
        let path = Self::resolve(input);
        if !path.is_file() {
            return Err(RecapError::InvalidInput(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let text = tokio::fs::read_to_string(&path).await?;
        if text.trim().is_empty() {
            return Err(RecapError::Fetch(format!("{} is empty", path.display())));
        }

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string();
        let path = path.canonicalize().unwrap_or(path);

        Ok(Document {
            kind: SourceKind::File,
            source_url: path.display().to_string(),
            title,
            text,
        })
    }
}
