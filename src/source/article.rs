//! Web article source.

use super::{Document, Source, SourceKind};
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = concat!("recap/", env!("CARGO_PKG_VERSION"));

/// Elements whose subtrees never contribute article text.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "template", "noscript", "svg", "nav", "header", "footer", "aside", "form",
];

/// Elements whose text forms one block.
const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "blockquote", "pre",
];

/// Web page source: fetches an http(s) URL and extracts its readable text.
pub struct ArticleSource {
    client: reqwest::Client,
}

impl ArticleSource {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ArticleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for ArticleSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Article
    }

    fn can_handle(&self, input: &str) -> bool {
        Url::parse(input.trim())
            .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
            .unwrap_or(false)
    }

    async fn fetch(&self, input: &str) -> Result<Document> {
        let url = input.trim();
        info!("Fetching article {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RecapError::Fetch(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecapError::Fetch(format!("{} returned {}", url, status)));
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        debug!("Downloaded {} bytes from {}", body.len(), final_url);

        let (title, text) = extract_article(&body);
        if text.is_empty() {
            return Err(RecapError::Fetch(format!(
                "No readable text found at {}",
                url
            )));
        }

        info!("Article extracted: {} chars", text.len());
        Ok(Document {
            kind: SourceKind::Article,
            source_url: final_url.clone(),
            title: title.unwrap_or(final_url),
            text,
        })
    }
}

/// Extract the title and block text of an HTML page.
///
/// Text comes from the first of `article`, `main` or `body`; blocks are
/// separated by blank lines.
pub fn extract_article(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);
    let title = page_title(&document);

    let root = ["article", "main", "body"]
        .iter()
        .filter_map(|tag| Selector::parse(tag).ok())
        .find_map(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let blocks: Vec<String> = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| BLOCK_TAGS.contains(&el.value().name()))
        .filter(|el| !inside(el, root, SKIPPED_TAGS) && !inside(el, root, BLOCK_TAGS))
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();

    (title, blocks.join("\n\n"))
}

/// Whether `el` sits below an element named in `tags`, stopping at `root`.
fn inside(el: &ElementRef<'_>, root: ElementRef<'_>, tags: &[&str]) -> bool {
    for ancestor in el.ancestors() {
        if ancestor.id() == root.id() {
            return false;
        }
        if let Some(element) = ancestor.value().as_element() {
            if tags.contains(&element.name()) {
                return true;
            }
        }
    }
    false
}

fn page_title(document: &Html) -> Option<String> {
    let og = Selector::parse(r#"meta[property="og:title"]"#).ok()?;
    let og_title = document
        .select(&og)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(collapse_whitespace);

    og_title.filter(|t| !t.is_empty()).or_else(|| {
        let title = Selector::parse("title").ok()?;
        document
            .select(&title)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
