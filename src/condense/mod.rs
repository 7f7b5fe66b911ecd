//! Map-reduce condensation of long content into a listenable script.
//!
//! The pipeline is all-or-nothing:
//!
//! 1. split the content into overlapping chunks,
//! 2. condense every chunk through the backend (map),
//! 3. merge the condensed chunks, in batches if needed (reduce).
//!
//! Every backend response must carry a `<final_script>` block. A response
//! without one, or a backend failure, aborts the whole request with an
//! error naming the chunk or batch; no partial script is ever returned.

mod contract;
mod map;
mod reduce;

pub use contract::{extract_script, Extraction, MarkerPair};
pub use map::map_chunks;
pub use reduce::{reduce_results, tail_chars, ReduceConfig, BATCH_SEPARATOR, RESULT_SEPARATOR};

use crate::backend::{Backend, GenerationMode};
use crate::chunking::{RecursiveSplitter, SplitConfig};
use crate::config::{CondenseSettings, Prompts};
use crate::error::{RecapError, Result};
use std::sync::Arc;
use tracing::{info, instrument};

/// Outcome of a successful condensation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condensation {
    /// The condensed script.
    pub text: String,
    /// Characters in the original content.
    pub original_chars: usize,
    /// Number of chunks the content was split into.
    pub chunks: usize,
    /// Number of reduce calls made.
    pub reduce_batches: usize,
}

/// Runs the map-reduce pipeline against one backend.
pub struct Condenser {
    backend: Arc<dyn Backend>,
    prompts: Prompts,
    settings: CondenseSettings,
    markers: MarkerPair,
    mode: GenerationMode,
}

impl Condenser {
    /// Create a condenser with default prompts and settings.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            prompts: Prompts::default(),
            settings: CondenseSettings::default(),
            markers: MarkerPair::default(),
            mode: GenerationMode::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_settings(mut self, settings: CondenseSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn settings(&self) -> &CondenseSettings {
        &self.settings
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    /// Condense `content` and return only the script.
    pub async fn condense(&self, content: &str) -> Result<String> {
        Ok(self.run(content).await?.text)
    }

    /// Condense `content`, returning the script with pipeline statistics.
    #[instrument(skip(self, content), fields(backend = %self.backend.name(), chars = content.len()))]
    pub async fn run(&self, content: &str) -> Result<Condensation> {
        if content.trim().is_empty() {
            return Err(RecapError::InvalidInput(
                "Nothing to condense: content is empty".to_string(),
            ));
        }
        self.settings.validate()?;

        let original_chars = content.chars().count();
        info!("Starting condensation of {} chars", original_chars);

        let splitter = RecursiveSplitter::new(SplitConfig::from(&self.settings));
        let chunks = splitter.split(content);
        info!("Content split into {} chunks", chunks.len());

        let results = map_chunks(
            self.backend.as_ref(),
            &self.prompts,
            &self.markers,
            &chunks,
            self.mode,
        )
        .await?;

        let config = ReduceConfig {
            batch_size: self.settings.reduce_batch_size,
            context_cap: self.settings.context_cap,
        };
        let text = reduce_results(
            self.backend.as_ref(),
            &self.prompts,
            &self.markers,
            &results,
            config,
            self.mode,
        )
        .await?;

        info!(
            "Condensation complete: {} -> {} chars",
            original_chars,
            text.chars().count()
        );

        Ok(Condensation {
            text,
            original_chars,
            chunks: chunks.len(),
            reduce_batches: results.len().div_ceil(config.batch_size.max(1)),
        })
    }
}

/// Condense `content` with default settings.
pub async fn condense(content: &str, backend: Arc<dyn Backend>) -> Result<String> {
    Condenser::new(backend).condense(content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ScriptedBackend, ScriptedReply};
    use crate::error::Stage;

    fn prose(chars: usize) -> String {
        let sentence = "The quick brown fox jumps over the lazy dog. ";
        sentence.repeat(chars / sentence.len() + 1).chars().take(chars).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_three_chunks_single_reduce() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            ScriptedReply::text("<final_script>chunk-0-ok</final_script>"),
            ScriptedReply::text("<final_script>chunk-1-ok</final_script>"),
            ScriptedReply::text("<final_script>chunk-2-ok</final_script>"),
            ScriptedReply::text("<final_script>final-ok</final_script>"),
        ]));

        let condensation = Condenser::new(backend.clone())
            .run(&prose(25_000))
            .await
            .unwrap();

        assert_eq!(condensation.text, "final-ok");
        assert_eq!(condensation.chunks, 3);
        assert_eq!(condensation.reduce_batches, 1);
        assert_eq!(condensation.original_chars, 25_000);

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[3].contains("chunk-0-ok\n\n---\n\nchunk-1-ok\n\n---\n\nchunk-2-ok"));
    }

    #[tokio::test]
    async fn test_many_chunks_reduce_in_batches() {
        let backend = Arc::new(ScriptedBackend::from_fn(|prompt| {
            if prompt.contains("Previous section") {
                "<final_script>continued</final_script>".to_string()
            } else if prompt.contains("Sections:") {
                "<final_script>opening</final_script>".to_string()
            } else {
                "<final_script>piece</final_script>".to_string()
            }
        }));

        let settings = CondenseSettings {
            chunk_size: 1_000,
            chunk_overlap: 50,
            reduce_batch_size: 3,
            context_cap: 100,
        };
        let condensation = Condenser::new(backend.clone())
            .with_settings(settings)
            .with_mode(GenerationMode::OneShot)
            .run(&prose(6_500))
            .await
            .unwrap();

        assert_eq!(condensation.chunks, 7);
        assert_eq!(condensation.reduce_batches, 3);
        assert_eq!(condensation.text, "opening\n\ncontinued\n\ncontinued");
        assert_eq!(backend.calls(), 7 + 3);
    }

    #[tokio::test]
    async fn test_map_failure_means_no_reduce() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            ScriptedReply::text("<final_script>fine</final_script>"),
            ScriptedReply::text("lost my tags"),
        ]));

        let err = Condenser::new(backend.clone())
            .condense(&prose(15_000))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Map { index: 1, total: 2 }));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let err = condense("   \n ", backend.clone()).await.unwrap_err();
        assert!(matches!(err, RecapError::InvalidInput(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_settings_fail_before_backend() {
        let backend = Arc::new(ScriptedBackend::new(Vec::new()));
        let settings = CondenseSettings {
            chunk_overlap: 20_000,
            ..CondenseSettings::default()
        };
        let err = Condenser::new(backend.clone())
            .with_settings(settings)
            .condense("text")
            .await
            .unwrap_err();
        assert!(matches!(err, RecapError::Config(_)));
        assert_eq!(backend.calls(), 0);
    }
}
