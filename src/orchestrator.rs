//! Pipeline orchestrator for Recap.
//!
//! Coordinates the whole process from fetching content to condensing it,
//! speaking it and archiving the script.

use crate::archive::save_script;
use crate::backend::{create_backend, Backend, GenerationMode};
use crate::condense::Condenser;
use crate::config::{Prompts, Settings};
use crate::conversation::Conversation;
use crate::error::{RecapError, Result};
use crate::source::{detect_source, Document, SourceKind};
use crate::speech::{save_audio, OpenAiSpeaker, Speaker};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

/// What to do with a condensed script besides returning it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// Synthesize speech for the script.
    pub speak: bool,
    /// Write the script to the output directory.
    pub save: bool,
}

/// Result of processing one input.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub title: String,
    pub kind: SourceKind,
    pub source_url: String,
    pub original_chars: usize,
    pub condensed_chars: usize,
    pub chunks: usize,
    pub text: String,
    pub audio_path: Option<PathBuf>,
    pub script_path: Option<PathBuf>,
    /// Why speech was requested but not produced.
    pub speech_error: Option<String>,
}

/// The main orchestrator for the Recap pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    backend: Arc<dyn Backend>,
    conversation_backend: Arc<dyn Backend>,
    speaker: OnceCell<Arc<dyn Speaker>>,
}

impl Orchestrator {
    /// Create an orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let backend = create_backend(&settings.backend, &settings.backend.model)?;
        let conversation_backend = if settings.conversation_model() == settings.backend.model {
            backend.clone()
        } else {
            create_backend(&settings.backend, settings.conversation_model())?
        };
        info!(
            "Using {} for condensation and {} for conversation",
            backend.name(),
            conversation_backend.name()
        );

        Ok(Self {
            settings,
            prompts,
            backend,
            conversation_backend,
            speaker: OnceCell::new(),
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        backend: Arc<dyn Backend>,
        speaker: Option<Arc<dyn Speaker>>,
    ) -> Self {
        Self {
            settings,
            prompts,
            conversation_backend: backend.clone(),
            backend,
            speaker: OnceCell::new_with(speaker),
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn mode(&self) -> GenerationMode {
        GenerationMode::from_stream_flag(self.settings.backend.stream)
    }

    /// A condenser configured from settings.
    pub fn condenser(&self) -> Condenser {
        Condenser::new(self.backend.clone())
            .with_prompts(self.prompts.clone())
            .with_settings(self.settings.condense.clone())
            .with_mode(self.mode())
    }

    /// A conversation engine configured from settings.
    pub fn conversation(&self) -> Conversation {
        Conversation::new(self.conversation_backend.clone())
            .with_prompts(self.prompts.clone())
            .with_window(self.settings.conversation.window_turns)
            .with_mode(self.mode())
    }

    /// Speaker for audio output, created on first use when not injected
    /// and shared by every later call. A failed creation is retried.
    pub async fn speaker(&self) -> Result<Arc<dyn Speaker>> {
        self.speaker
            .get_or_try_init(|| async {
                let speaker: Arc<dyn Speaker> =
                    Arc::new(OpenAiSpeaker::from_settings(&self.settings.speech)?);
                Ok::<_, RecapError>(speaker)
            })
            .await
            .cloned()
    }

    /// Synthesize `text` and save it to the output directory.
    pub async fn speak(&self, text: &str) -> Result<PathBuf> {
        let speaker = self.speaker().await?;
        let audio = speaker.synthesize(text).await?;
        save_audio(&audio, &self.settings.output_dir(), speaker.format()).await
    }

    /// Fetch `input` (URL, video id or file path) and process it.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn process(&self, input: &str, options: ProcessOptions) -> Result<ProcessResult> {
        let source = detect_source(input)?;
        eprintln!("  Fetching {}...", source.kind());
        let document = source.fetch(input).await?;
        eprintln!("  Title: {}", document.title);
        eprintln!("  Length: {} chars", document.char_count());

        self.process_document(document, options).await
    }

    /// Condense an already fetched document, then speak and save as requested.
    ///
    /// A speech failure does not fail the request: the script is archived
    /// instead and the error is reported in the result.
    pub async fn process_document(
        &self,
        document: Document,
        options: ProcessOptions,
    ) -> Result<ProcessResult> {
        eprintln!("  Condensing...");
        let condensation = self.condenser().run(&document.text).await?;
        eprintln!(
            "  Condensed {} chunks into {} chars",
            condensation.chunks,
            condensation.text.chars().count()
        );

        let mut audio_path = None;
        let mut speech_error = None;
        if options.speak {
            eprintln!("  Synthesizing speech...");
            match self.speak(&condensation.text).await {
                Ok(path) => audio_path = Some(path),
                Err(e) => {
                    warn!("Speech synthesis failed, archiving script instead: {}", e);
                    speech_error = Some(e.to_string());
                }
            }
        }

        let script_path = if options.save || speech_error.is_some() {
            Some(
                save_script(
                    &self.settings.output_dir(),
                    &document.source_url,
                    &condensation.text,
                    audio_path.as_deref(),
                )
                .await?,
            )
        } else {
            None
        };

        Ok(ProcessResult {
            title: document.title,
            kind: document.kind,
            source_url: document.source_url,
            original_chars: condensation.original_chars,
            condensed_chars: condensation.text.chars().count(),
            chunks: condensation.chunks,
            text: condensation.text,
            audio_path,
            script_path,
            speech_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ScriptedBackend, ScriptedReply};
    use async_trait::async_trait;

    struct FakeSpeaker {
        fail: bool,
    }

    #[async_trait]
    impl Speaker for FakeSpeaker {
        fn format(&self) -> &str {
            "mp3"
        }

        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            if self.fail {
                Err(RecapError::Speech("quota exceeded".to_string()))
            } else {
                Ok(text.as_bytes().to_vec())
            }
        }
    }

    fn settings_in(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.output_dir = dir.to_string_lossy().to_string();
        settings
    }

    fn document(text: &str) -> Document {
        Document {
            kind: SourceKind::Article,
            source_url: "https://example.com/story".to_string(),
            title: "Story".to_string(),
            text: text.to_string(),
        }
    }

    fn backend() -> Arc<ScriptedBackend> {
        Arc::new(ScriptedBackend::new(vec![
            ScriptedReply::text("<final_script>piece</final_script>"),
            ScriptedReply::text("<final_script>The script.</final_script>"),
        ]))
    }

    #[tokio::test]
    async fn test_process_document_with_speech_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let speaker: Arc<dyn Speaker> = Arc::new(FakeSpeaker { fail: false });
        let orchestrator = Orchestrator::with_components(
            settings_in(dir.path()),
            Prompts::default(),
            backend(),
            Some(speaker),
        );

        let result = orchestrator
            .process_document(
                document("A short article."),
                ProcessOptions {
                    speak: true,
                    save: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.text, "The script.");
        assert_eq!(result.chunks, 1);
        assert_eq!(result.original_chars, 16);
        let audio = result.audio_path.unwrap();
        assert_eq!(std::fs::read(&audio).unwrap(), b"The script.");
        let script = std::fs::read_to_string(result.script_path.unwrap()).unwrap();
        assert!(script.contains(&audio.display().to_string()));
        assert!(result.speech_error.is_none());
    }

    #[tokio::test]
    async fn test_speech_failure_falls_back_to_archive() {
        let dir = tempfile::tempdir().unwrap();
        let speaker: Arc<dyn Speaker> = Arc::new(FakeSpeaker { fail: true });
        let orchestrator = Orchestrator::with_components(
            settings_in(dir.path()),
            Prompts::default(),
            backend(),
            Some(speaker),
        );

        let result = orchestrator
            .process_document(
                document("A short article."),
                ProcessOptions {
                    speak: true,
                    save: false,
                },
            )
            .await
            .unwrap();

        assert!(result.audio_path.is_none());
        assert!(result.speech_error.unwrap().contains("quota exceeded"));
        assert!(result.script_path.unwrap().exists());
    }

    #[tokio::test]
    async fn test_speaker_is_shared_between_calls() {
        let dir = tempfile::tempdir().unwrap();
        let speaker: Arc<dyn Speaker> = Arc::new(FakeSpeaker { fail: false });
        let orchestrator = Orchestrator::with_components(
            settings_in(dir.path()),
            Prompts::default(),
            backend(),
            Some(speaker.clone()),
        );

        let first = orchestrator.speaker().await.unwrap();
        let second = orchestrator.speaker().await.unwrap();
        assert!(Arc::ptr_eq(&first, &speaker));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_speaker_creation_failure_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.speech.voice = "robot".to_string();
        let orchestrator =
            Orchestrator::with_components(settings, Prompts::default(), backend(), None);

        assert!(orchestrator.speaker().await.is_err());
        assert!(orchestrator.speaker().await.is_err());
        assert!(orchestrator.speak("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_plain_condense_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::with_components(
            settings_in(dir.path()),
            Prompts::default(),
            backend(),
            None,
        );

        let result = orchestrator
            .process_document(document("A short article."), ProcessOptions::default())
            .await
            .unwrap();

        assert!(result.audio_path.is_none());
        assert!(result.script_path.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_contract_violation_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new(vec![ScriptedReply::text("no tags")]));
        let orchestrator = Orchestrator::with_components(
            settings_in(dir.path()),
            Prompts::default(),
            backend,
            None,
        );

        let err = orchestrator
            .process_document(document("text"), ProcessOptions::default())
            .await
            .unwrap_err();
        assert!(err.stage().is_some());
    }
}
