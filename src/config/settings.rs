//! Configuration settings for Recap.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub backend: BackendSettings,
    pub condense: CondenseSettings,
    pub conversation: ConversationSettings,
    pub speech: SpeechSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory where audio files and saved scripts are written.
    pub output_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.recap".to_string(),
            output_dir: "~/.recap/output".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Generation backend provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// api.openai.com.
    #[default]
    OpenAI,
    /// Groq's OpenAI-compatible endpoint.
    Groq,
    /// A local Ollama server.
    Ollama,
}

impl BackendProvider {
    /// Default API base for this provider.
    pub fn default_api_base(&self) -> &'static str {
        match self {
            BackendProvider::OpenAI => "https://api.openai.com/v1",
            BackendProvider::Groq => "https://api.groq.com/openai/v1",
            BackendProvider::Ollama => "http://localhost:11434/v1",
        }
    }

    /// Environment variable holding the API key for this provider.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            BackendProvider::OpenAI => "OPENAI_API_KEY",
            BackendProvider::Groq => "GROQ_API_KEY",
            BackendProvider::Ollama => "OLLAMA_API_KEY",
        }
    }

    /// Whether requests fail without an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, BackendProvider::Ollama)
    }
}

impl std::str::FromStr for BackendProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(BackendProvider::OpenAI),
            "groq" => Ok(BackendProvider::Groq),
            "ollama" | "local" => Ok(BackendProvider::Ollama),
            _ => Err(format!("Unknown backend provider: {}", s)),
        }
    }
}

impl std::fmt::Display for BackendProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendProvider::OpenAI => write!(f, "openai"),
            BackendProvider::Groq => write!(f, "groq"),
            BackendProvider::Ollama => write!(f, "ollama"),
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Which OpenAI-compatible service to talk to.
    pub provider: BackendProvider,
    /// Model used for condensation.
    pub model: String,
    /// Override for the provider's API base URL.
    pub api_base: Option<String>,
    /// Override for the environment variable holding the API key.
    pub api_key_env: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens per response. None = provider default.
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Stream responses instead of waiting for a single completion.
    pub stream: bool,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            provider: BackendProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key_env: None,
            temperature: 0.3,
            max_tokens: None,
            timeout_secs: 300,
            stream: true,
        }
    }
}

impl BackendSettings {
    /// Resolved API base URL.
    pub fn api_base(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| self.provider.default_api_base().to_string())
    }

    /// Resolved API key environment variable name.
    pub fn api_key_env(&self) -> String {
        self.api_key_env
            .clone()
            .unwrap_or_else(|| self.provider.default_api_key_env().to_string())
    }
}

/// Map-reduce condensation knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CondenseSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
    /// Maximum number of map results reduced in one call.
    pub reduce_batch_size: usize,
    /// Maximum characters of the previous batch carried into the next.
    pub context_cap: usize,
}

impl Default for CondenseSettings {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            chunk_overlap: 200,
            reduce_batch_size: 5,
            context_cap: 3_000,
        }
    }
}

impl CondenseSettings {
    /// Apply `RECAP_*` environment overrides on top of the file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&str, &mut usize); 4] = [
            ("RECAP_CHUNK_SIZE", &mut self.chunk_size),
            ("RECAP_CHUNK_OVERLAP", &mut self.chunk_overlap),
            ("RECAP_REDUCE_BATCH_SIZE", &mut self.reduce_batch_size),
            ("RECAP_CONTEXT_CAP", &mut self.context_cap),
        ];

        for (key, field) in fields {
            if let Some(raw) = lookup(key) {
                match raw.trim().parse::<usize>() {
                    Ok(value) => *field = value,
                    Err(_) => warn!("Ignoring {}={:?}: not a non-negative integer", key, raw),
                }
            }
        }
    }

    /// Check that the knobs describe a usable pipeline.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chunk_size == 0 {
            return Err(crate::error::RecapError::Config(
                "condense.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(crate::error::RecapError::Config(format!(
                "condense.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.reduce_batch_size == 0 {
            return Err(crate::error::RecapError::Config(
                "condense.reduce_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Question-answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    /// Model override for conversations. None = backend model.
    pub model: Option<String>,
    /// Number of question/answer exchanges kept after the seeded opening.
    pub window_turns: usize,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            model: None,
            window_turns: 100,
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// TTS model.
    pub model: String,
    /// Voice name.
    pub voice: String,
    /// Audio container (mp3, wav, opus, aac, flac).
    pub format: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            format: "mp3".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides for the condensation knobs are applied last.
    /// The knobs are not validated here; see [`CondenseSettings::validate`].
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.condense.apply_env();
        Ok(settings)
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::RecapError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recap")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Model used for question answering.
    pub fn conversation_model(&self) -> &str {
        self.conversation
            .model
            .as_deref()
            .unwrap_or(&self.backend.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_condense_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.condense.chunk_size, 10_000);
        assert_eq!(settings.condense.chunk_overlap, 200);
        assert_eq!(settings.condense.reduce_batch_size, 5);
        assert_eq!(settings.condense.context_cap, 3_000);
        assert_eq!(settings.general.log_level, "warn");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [backend]
            provider = "groq"
            model = "openai/gpt-oss-20b"

            [condense]
            reduce_batch_size = 3
            "#,
        )
        .unwrap();

        assert_eq!(settings.backend.provider, BackendProvider::Groq);
        assert_eq!(settings.backend.api_base(), "https://api.groq.com/openai/v1");
        assert_eq!(settings.backend.api_key_env(), "GROQ_API_KEY");
        assert_eq!(settings.condense.reduce_batch_size, 3);
        assert_eq!(settings.condense.chunk_size, 10_000);
        assert_eq!(settings.conversation.window_turns, 100);
    }

    #[test]
    fn test_env_overrides() {
        let mut condense = CondenseSettings::default();
        let vars: HashMap<&str, &str> = [
            ("RECAP_CHUNK_SIZE", "4000"),
            ("RECAP_REDUCE_BATCH_SIZE", "not-a-number"),
            ("RECAP_CONTEXT_CAP", " 500 "),
        ]
        .into_iter()
        .collect();

        condense.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(condense.chunk_size, 4000);
        assert_eq!(condense.chunk_overlap, 200);
        assert_eq!(condense.reduce_batch_size, 5);
        assert_eq!(condense.context_cap, 500);
    }

    #[test]
    fn test_validate_rejects_bad_knobs() {
        let mut condense = CondenseSettings::default();
        condense.chunk_overlap = condense.chunk_size;
        assert!(condense.validate().is_err());

        let mut condense = CondenseSettings::default();
        condense.reduce_batch_size = 0;
        assert!(condense.validate().is_err());

        assert!(CondenseSettings::default().validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.backend.model = "llama3.2".to_string();
        settings.backend.provider = BackendProvider::Ollama;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.backend.model, "llama3.2");
        assert_eq!(loaded.backend.provider, BackendProvider::Ollama);
        assert!(!loaded.backend.provider.requires_api_key());
    }

    #[test]
    fn test_load_accepts_invalid_knobs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[condense]\nchunk_overlap = 20000\n").unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.condense.chunk_overlap, 20_000);

        let err = loaded.condense.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap (20000)"));
    }

    #[test]
    fn test_conversation_model_falls_back_to_backend() {
        let mut settings = Settings::default();
        assert_eq!(settings.conversation_model(), "gpt-4o-mini");
        settings.conversation.model = Some("gpt-4.1".to_string());
        assert_eq!(settings.conversation_model(), "gpt-4.1");
    }
}
