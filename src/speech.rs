//! Speech synthesis for condensed scripts and answers.

use crate::chunking::{RecursiveSplitter, SplitConfig};
use crate::config::{BackendProvider, BackendSettings, SpeechSettings};
use crate::error::{RecapError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Longest input the speech endpoint accepts in one request.
pub const MAX_SPEECH_CHARS: usize = 4096;

/// Trait for text-to-speech engines.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// File extension of the produced audio.
    fn format(&self) -> &str;

    /// Render `text` as encoded audio.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Speech through the OpenAI audio endpoint.
pub struct OpenAiSpeaker {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
    format: String,
    response_format: SpeechResponseFormat,
}

impl OpenAiSpeaker {
    pub fn from_settings(settings: &SpeechSettings) -> Result<Self> {
        let backend = BackendSettings {
            provider: BackendProvider::OpenAI,
            ..BackendSettings::default()
        };
        let client = create_client(&backend)?;

        Ok(Self {
            client,
            model: parse_model(&settings.model),
            voice: parse_voice(&settings.voice)?,
            format: settings.format.to_lowercase(),
            response_format: parse_format(&settings.format)?,
        })
    }

    async fn synthesize_piece(&self, text: &str) -> Result<Vec<u8>> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(self.model.clone())
            .voice(self.voice.clone())
            .response_format(self.response_format.clone())
            .build()
            .map_err(|e| RecapError::Speech(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| RecapError::OpenAI(format!("Speech API error: {}", e)))?;

        Ok(response.bytes.to_vec())
    }
}

#[async_trait]
impl Speaker for OpenAiSpeaker {
    fn format(&self) -> &str {
        &self.format
    }

    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let pieces = speech_pieces(text, MAX_SPEECH_CHARS);
        if pieces.is_empty() {
            return Err(RecapError::InvalidInput("Nothing to speak".to_string()));
        }
        if pieces.len() > 1 && !concatenates(&self.format) {
            return Err(RecapError::Speech(format!(
                "Text is {} chars; {} output is limited to {} chars",
                text.chars().count(),
                self.format,
                MAX_SPEECH_CHARS
            )));
        }

        info!("Synthesizing speech in {} pieces", pieces.len());
        let mut audio = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            debug!("Speech piece {}/{}: {} chars", i + 1, pieces.len(), piece.len());
            audio.extend(self.synthesize_piece(piece).await?);
        }
        Ok(audio)
    }
}

/// Split `text` into pieces of at most `max_chars`, breaking at paragraphs,
/// lines or words.
pub fn speech_pieces(text: &str, max_chars: usize) -> Vec<String> {
    let splitter = RecursiveSplitter::new(SplitConfig {
        chunk_size: max_chars,
        chunk_overlap: 0,
    });

    splitter
        .split(text)
        .into_iter()
        .map(|chunk| chunk.text.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Formats whose encoded streams can be appended back to back.
fn concatenates(format: &str) -> bool {
    matches!(format, "mp3" | "aac" | "opus" | "pcm")
}

fn parse_model(model: &str) -> SpeechModel {
    match model {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

fn parse_voice(voice: &str) -> Result<Voice> {
    match voice.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        other => Err(RecapError::Config(format!("Unknown voice: {}", other))),
    }
}

fn parse_format(format: &str) -> Result<SpeechResponseFormat> {
    match format.to_lowercase().as_str() {
        "mp3" => Ok(SpeechResponseFormat::Mp3),
        "opus" => Ok(SpeechResponseFormat::Opus),
        "aac" => Ok(SpeechResponseFormat::Aac),
        "flac" => Ok(SpeechResponseFormat::Flac),
        "wav" => Ok(SpeechResponseFormat::Wav),
        "pcm" => Ok(SpeechResponseFormat::Pcm),
        other => Err(RecapError::Config(format!("Unknown audio format: {}", other))),
    }
}

/// Write `audio` to `dir` as `recap_<timestamp>.<format>` and return its path.
pub async fn save_audio(audio: &[u8], dir: &Path, format: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
    let path = dir.join(format!("recap_{}.{}", timestamp, format));
    tokio::fs::write(&path, audio).await?;
    info!("Audio saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_pieces_short_text_is_one_piece() {
        assert_eq!(speech_pieces("Hello there.", 100), vec!["Hello there."]);
        assert!(speech_pieces("   ", 100).is_empty());
    }

    #[test]
    fn test_speech_pieces_respect_limit() {
        let text = "One sentence here. ".repeat(50);
        let pieces = speech_pieces(&text, 100);
        assert!(pieces.len() > 1);
        assert!(pieces.iter().all(|p| p.chars().count() <= 100));
        assert!(pieces[0].starts_with("One sentence here."));

        let rejoined: String = pieces.join(" ");
        assert_eq!(
            rejoined.split_whitespace().count(),
            text.split_whitespace().count()
        );
    }

    #[test]
    fn test_parse_settings_values() {
        assert!(matches!(parse_voice("Nova"), Ok(Voice::Nova)));
        assert!(parse_voice("robot").is_err());
        assert!(matches!(parse_format("MP3"), Ok(SpeechResponseFormat::Mp3)));
        assert!(parse_format("ogg").is_err());
        assert!(matches!(parse_model("tts-1-hd"), SpeechModel::Tts1Hd));
        assert!(matches!(parse_model("gpt-4o-mini-tts"), SpeechModel::Other(_)));
    }

    #[test]
    fn test_concatenates() {
        assert!(concatenates("mp3"));
        assert!(!concatenates("wav"));
        assert!(!concatenates("flac"));
    }

    #[tokio::test]
    async fn test_save_audio() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("audio");
        let path = save_audio(b"ID3fake", &out, "mp3").await.unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("recap_"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(std::fs::read(&path).unwrap(), b"ID3fake");
    }
}
