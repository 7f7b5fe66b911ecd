//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{BackendSettings, Settings};
use crate::error::{RecapError, Result};
use crate::source::{Source, SourceKind, YoutubeSource};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Condensing needs the backend key, plus yt-dlp for videos.
    Condense { source: SourceKind },
    /// Speech needs an OpenAI key.
    Speak,
    /// Splitting runs locally.
    Split,
}

impl Operation {
    /// Condense requirements for a raw input.
    pub fn condense_input(input: &str) -> Self {
        let source = if YoutubeSource::new().can_handle(input) {
            SourceKind::YouTube
        } else {
            SourceKind::Article
        };
        Operation::Condense { source }
    }
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Condense { source } => {
            check_api_key(&settings.backend)?;
            if source == SourceKind::YouTube {
                check_tool("yt-dlp")?;
            }
        }
        Operation::Speak => {
            check_api_key(&BackendSettings::default())?;
        }
        Operation::Split => {}
    }
    Ok(())
}

/// Check that the backend's API key is configured, if it needs one.
pub fn check_api_key(backend: &BackendSettings) -> Result<()> {
    if !backend.provider.requires_api_key() {
        return Ok(());
    }
    let key_env = backend.api_key_env();
    match std::env::var(&key_env) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(RecapError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            key_env, key_env
        ))),
        Err(_) => Err(RecapError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            key_env, key_env
        ))),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(RecapError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(RecapError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(RecapError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
