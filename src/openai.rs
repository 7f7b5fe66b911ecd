//! OpenAI-compatible client configuration with sensible defaults.

use crate::config::BackendSettings;
use crate::error::{RecapError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for the configured provider.
///
/// The API key is read from the provider's environment variable; providers
/// that don't need one (Ollama) get a placeholder.
pub fn create_client(settings: &BackendSettings) -> Result<Client<OpenAIConfig>> {
    let key_env = settings.api_key_env();
    let api_key = match std::env::var(&key_env) {
        Ok(key) if !key.is_empty() => key,
        _ if settings.provider.requires_api_key() => {
            return Err(RecapError::Config(format!(
                "{} not set. Set it with: export {}='...'",
                key_env, key_env
            )))
        }
        _ => "ollama".to_string(),
    };

    let config = OpenAIConfig::new()
        .with_api_base(settings.api_base())
        .with_api_key(api_key);

    let timeout = if settings.timeout_secs == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        settings.timeout_secs
    };

    create_client_with_timeout(config, Duration::from_secs(timeout))
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RecapError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
