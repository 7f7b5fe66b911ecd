//! OpenAI-compatible chat completion backend (OpenAI, Groq, Ollama).

use super::{Backend, FragmentStream};
use crate::config::BackendSettings;
use crate::error::{RecapError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Chat completion backend.
///
/// The whole prompt, instructions included, is sent as one user message.
pub struct OpenAiBackend {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    provider: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiBackend {
    /// Create a backend for `model` using the provider settings.
    pub fn from_settings(settings: &BackendSettings, model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            provider: settings.provider.to_string(),
            model: model.to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| RecapError::OpenAI(e.to_string()))?
                .into(),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            args.max_completion_tokens(max_tokens);
        }

        args.build().map_err(|e| RecapError::OpenAI(e.to_string()))
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn name(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            RecapError::BackendUnavailable(format!("{}: {}", self.name(), e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!("Received {} chars", content.len());
        Ok(content)
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream> {
        let request = self.build_request(prompt)?;
        let name = self.name();

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| RecapError::BackendUnavailable(format!("{}: {}", name, e)))?;

        Ok(stream
            .map(move |item| match item {
                Ok(response) => Ok(response
                    .choices
                    .iter()
                    .filter_map(|c| c.delta.content.as_deref())
                    .collect::<String>()),
                Err(e) => Err(RecapError::BackendUnavailable(format!("{}: {}", name, e))),
            })
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendProvider;

    fn local_settings() -> BackendSettings {
        BackendSettings {
            provider: BackendProvider::Ollama,
            max_tokens: Some(1000),
            ..BackendSettings::default()
        }
    }

    #[test]
    fn test_backend_name() {
        let backend = OpenAiBackend::from_settings(&local_settings(), "llama3.2").unwrap();
        assert_eq!(backend.name(), "ollama/llama3.2");
        assert_eq!(backend.model(), "llama3.2");
    }

    #[test]
    fn test_request_carries_prompt_and_limits() {
        let backend = OpenAiBackend::from_settings(&local_settings(), "llama3.2").unwrap();
        let request = backend.build_request("condense this").unwrap();

        assert_eq!(request.model, "llama3.2");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.max_completion_tokens, Some(1000));
        assert_eq!(request.temperature, Some(0.3));
    }
}
