//! YouTube transcript source.

use super::{Document, Source, SourceKind};
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

/// Caption format requested from YouTube.
const CAPTION_FORMAT: &str = "json3";

/// YouTube video transcript source.
pub struct YoutubeSource {
    video_id_regex: Regex,
    languages: Vec<String>,
    client: reqwest::Client,
}

impl YoutubeSource {
    pub fn new() -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/|youtube\.com/live/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self {
            video_id_regex,
            languages: vec!["en".to_string()],
            client: reqwest::Client::new(),
        }
    }

    /// Preferred caption languages, most preferred first.
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    /// Extract video ID from a YouTube URL or bare ID.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch video metadata, including caption track URLs, using yt-dlp.
    async fn fetch_metadata(&self, url: &str) -> Result<Value> {
        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--skip-download", "--no-warnings", url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RecapError::ToolNotFound("yt-dlp".to_string())
                } else {
                    RecapError::Fetch(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecapError::Fetch(format!(
                "Video {} not found or unavailable: {}",
                url,
                stderr.trim()
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&json_str)
            .map_err(|e| RecapError::Fetch(format!("Failed to parse yt-dlp output: {}", e)))
    }

    /// Pick a caption track URL, preferring manual subtitles over automatic ones.
    pub fn caption_url(&self, metadata: &Value) -> Option<String> {
        ["subtitles", "automatic_captions"]
            .iter()
            .find_map(|key| self.track_in(&metadata[*key]))
    }

    fn track_in(&self, tracks: &Value) -> Option<String> {
        let tracks = tracks.as_object()?;
        for lang in &self.languages {
            let exact = tracks.get(lang);
            let regional = || {
                tracks
                    .iter()
                    .find(|(code, _)| code.starts_with(&format!("{}-", lang)))
                    .map(|(_, formats)| formats)
            };
            if let Some(url) = exact.or_else(regional).and_then(json3_url) {
                return Some(url);
            }
        }
        None
    }
}

fn json3_url(formats: &Value) -> Option<String> {
    formats
        .as_array()?
        .iter()
        .find(|f| f["ext"].as_str() == Some(CAPTION_FORMAT))
        .and_then(|f| f["url"].as_str())
        .map(|s| s.to_string())
}

/// Join the text of every caption event with single spaces.
pub fn join_caption_events(captions: &Value) -> String {
    let Some(events) = captions["events"].as_array() else {
        return String::new();
    };

    events
        .iter()
        .filter_map(|event| event["segs"].as_array())
        .map(|segs| {
            segs.iter()
                .filter_map(|seg| seg["utf8"].as_str())
                .collect::<String>()
        })
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Default for YoutubeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for YoutubeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::YouTube
    }

    fn can_handle(&self, input: &str) -> bool {
        self.extract_video_id(input).is_some()
    }

    async fn fetch(&self, input: &str) -> Result<Document> {
        let video_id = self.extract_video_id(input).ok_or_else(|| {
            RecapError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", input))
        })?;
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        info!("Fetching transcript for video {}", video_id);

        let metadata = self.fetch_metadata(&url).await?;
        let title = metadata["title"]
            .as_str()
            .unwrap_or("Unknown Title")
            .to_string();

        let caption_url = self.caption_url(&metadata).ok_or_else(|| {
            RecapError::Fetch(format!("No transcript available for video {}", video_id))
        })?;
        debug!("Caption track: {}", caption_url);

        let captions: Value = self
            .client
            .get(&caption_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = join_caption_events(&captions);
        if text.is_empty() {
            return Err(RecapError::Fetch(format!(
                "No transcript available for video {}",
                video_id
            )));
        }

        info!("Transcript fetched: {} chars", text.len());
        Ok(Document {
            kind: SourceKind::YouTube,
            source_url: url,
            title,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_video_id() {
        let source = YoutubeSource::new();

        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(
                source.extract_video_id(input),
                Some("dQw4w9WgXcQ".to_string()),
                "{input}"
            );
        }

        assert_eq!(source.extract_video_id("not-a-video-id"), None);
        assert_eq!(source.extract_video_id(""), None);
    }

    #[test]
    fn test_can_handle() {
        let source = YoutubeSource::new();

        assert!(source.can_handle("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!source.can_handle("https://example.com/article"));
        assert!(!source.can_handle("/path/to/notes.txt"));
    }

    #[test]
    fn test_join_caption_events() {
        let captions = json!({
            "events": [
                { "tStartMs": 0, "segs": [{ "utf8": "hello" }, { "utf8": " there" }] },
                { "tStartMs": 900 },
                { "tStartMs": 1000, "segs": [{ "utf8": "\n" }] },
                { "tStartMs": 2000, "segs": [{ "utf8": "general\nkenobi" }] }
            ]
        });
        assert_eq!(join_caption_events(&captions), "hello there general kenobi");
        assert_eq!(join_caption_events(&json!({})), "");
    }

    #[test]
    fn test_caption_url_prefers_manual_then_regional() {
        let source = YoutubeSource::new();
        let metadata = json!({
            "subtitles": {
                "fr": [{ "ext": "json3", "url": "https://captions/fr" }]
            },
            "automatic_captions": {
                "en-US": [
                    { "ext": "vtt", "url": "https://captions/en-vtt" },
                    { "ext": "json3", "url": "https://captions/en-json3" }
                ]
            }
        });
        assert_eq!(
            source.caption_url(&metadata),
            Some("https://captions/en-json3".to_string())
        );

        let metadata = json!({
            "subtitles": { "en": [{ "ext": "json3", "url": "https://captions/manual" }] },
            "automatic_captions": { "en": [{ "ext": "json3", "url": "https://captions/auto" }] }
        });
        assert_eq!(
            source.caption_url(&metadata),
            Some("https://captions/manual".to_string())
        );

        assert_eq!(source.caption_url(&json!({ "subtitles": {} })), None);
    }
}
