//! Content sources: where the text to condense comes from.
//!
//! Each source recognises the inputs it can handle (a URL, a video id, a
//! file path) and fetches them into a plain-text [`Document`].

mod article;
mod file;
mod youtube;

pub use article::{extract_article, ArticleSource};
pub use file::FileSource;
pub use youtube::{join_caption_events, YoutubeSource};

use crate::error::{RecapError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    YouTube,
    Article,
    File,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::YouTube => write!(f, "youtube"),
            SourceKind::Article => write!(f, "article"),
            SourceKind::File => write!(f, "file"),
        }
    }
}

/// Fetched content ready for condensation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub kind: SourceKind,
    /// Canonical URL or path the text came from.
    pub source_url: String,
    pub title: String,
    pub text: String,
}

impl Document {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Trait for content source providers.
#[async_trait]
pub trait Source: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Check if this source can handle the given input.
    fn can_handle(&self, input: &str) -> bool;

    /// Fetch the input's text.
    async fn fetch(&self, input: &str) -> Result<Document>;
}

/// Detect the appropriate source for the given input.
pub fn detect_source(input: &str) -> Result<Box<dyn Source>> {
    let youtube = YoutubeSource::new();
    if youtube.can_handle(input) {
        return Ok(Box::new(youtube));
    }

    let article = ArticleSource::new();
    if article.can_handle(input) {
        return Ok(Box::new(article));
    }

    let file = FileSource::new();
    if file.can_handle(input) {
        return Ok(Box::new(file));
    }

    Err(RecapError::InvalidInput(format!(
        "Not a YouTube video, web URL or text file: {}",
        input
    )))
}

/// Detect the source for `input` and fetch it.
pub async fn fetch(input: &str) -> Result<Document> {
    detect_source(input)?.fetch(input).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_source_prefers_youtube() {
        let source = detect_source("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(source.kind(), SourceKind::YouTube);

        let source = detect_source("https://example.com/news/story").unwrap();
        assert_eq!(source.kind(), SourceKind::Article);
    }

    #[test]
    fn test_detect_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let source = detect_source(path.to_str().unwrap()).unwrap();
        assert_eq!(source.kind(), SourceKind::File);
    }

    #[test]
    fn test_detect_source_rejects_unknown() {
        let err = detect_source("just some words").err().unwrap();
        assert!(matches!(err, RecapError::InvalidInput(_)));
    }
}
