//! Generative text backends.
//!
//! The condensation pipeline talks to a [`Backend`] and never to a concrete
//! service. A backend either answers in one piece or streams fragments; the
//! pipeline always assembles the complete response with [`complete`] before
//! looking at it.

mod openai;
mod scripted;

pub use openai::OpenAiBackend;
pub use scripted::{ScriptedBackend, ScriptedReply};

use crate::config::BackendSettings;
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tracing::debug;

/// Ordered fragments of a streamed response.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Trait for text generation backends.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable backend identity (provider and model).
    fn name(&self) -> String;

    /// Generate a complete response for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a response as a stream of fragments in emission order.
    ///
    /// Default implementation yields the one-shot response as a single fragment.
    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream> {
        let text = self.generate(prompt).await?;
        Ok(stream::once(async move { Ok(text) }).boxed())
    }
}

/// How the pipeline asks a backend for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Single request, single response.
    OneShot,
    /// Streamed fragments, concatenated before use.
    #[default]
    Stream,
}

impl GenerationMode {
    pub fn from_stream_flag(stream: bool) -> Self {
        if stream {
            GenerationMode::Stream
        } else {
            GenerationMode::OneShot
        }
    }
}

/// Concatenate every fragment of `stream` in order.
///
/// A failing fragment aborts the whole response; nothing partial is returned.
/// A stream that produces no text at all means the backend is unavailable.
pub async fn collect_stream(mut stream: FragmentStream) -> Result<String> {
    let mut text = String::new();
    let mut fragments = 0usize;

    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
        fragments += 1;
    }

    if text.is_empty() {
        return Err(RecapError::BackendUnavailable(
            "backend returned no output".to_string(),
        ));
    }

    debug!("Assembled {} chars from {} fragments", text.len(), fragments);
    Ok(text)
}

/// Run `prompt` through `backend` and return the full response text.
pub async fn complete(backend: &dyn Backend, prompt: &str, mode: GenerationMode) -> Result<String> {
    match mode {
        GenerationMode::Stream => collect_stream(backend.generate_stream(prompt).await?).await,
        GenerationMode::OneShot => {
            let text = backend.generate(prompt).await?;
            if text.is_empty() {
                return Err(RecapError::BackendUnavailable(
                    "backend returned no output".to_string(),
                ));
            }
            Ok(text)
        }
    }
}

/// Create the configured backend for `model`.
pub fn create_backend(settings: &BackendSettings, model: &str) -> Result<Arc<dyn Backend>> {
    Ok(Arc::new(OpenAiBackend::from_settings(settings, model)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_stream_preserves_order() {
        let fragments: Vec<Result<String>> = vec![
            Ok("<final_".to_string()),
            Ok("script>hello".to_string()),
            Ok("</final_script>".to_string()),
        ];
        let text = collect_stream(stream::iter(fragments).boxed()).await.unwrap();
        assert_eq!(text, "<final_script>hello</final_script>");
    }

    #[tokio::test]
    async fn test_collect_stream_aborts_on_error() {
        let fragments: Vec<Result<String>> = vec![
            Ok("partial".to_string()),
            Err(RecapError::BackendUnavailable("connection reset".to_string())),
            Ok("never seen".to_string()),
        ];
        let err = collect_stream(stream::iter(fragments).boxed()).await.unwrap_err();
        assert!(matches!(err, RecapError::BackendUnavailable(msg) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn test_empty_stream_is_unavailable() {
        let fragments: Vec<Result<String>> = vec![Ok(String::new())];
        let err = collect_stream(stream::iter(fragments).boxed()).await.unwrap_err();
        assert!(matches!(err, RecapError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_complete_one_shot_and_stream_agree() {
        let backend = ScriptedBackend::from_fn(|_| "abcdefghij".to_string()).with_fragment_size(3);

        let streamed = complete(&backend, "p", GenerationMode::Stream).await.unwrap();
        let single = complete(&backend, "p", GenerationMode::OneShot).await.unwrap();
        assert_eq!(streamed, "abcdefghij");
        assert_eq!(single, streamed);
        assert_eq!(backend.prompts().len(), 2);
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(GenerationMode::from_stream_flag(true), GenerationMode::Stream);
        assert_eq!(GenerationMode::from_stream_flag(false), GenerationMode::OneShot);
    }
}
