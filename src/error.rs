//! Error types for Recap.

use std::fmt;
use thiserror::Error;

/// Pipeline stage at which a backend call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Per-chunk condensation call.
    Map { index: usize, total: usize },
    /// Per-batch reduce call. Single-batch reduction is batch 0 of 1.
    Reduce { index: usize, total: usize },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Map { index, total } => write!(f, "map chunk {}/{}", index + 1, total),
            Stage::Reduce { index, total } => write!(f, "reduce batch {}/{}", index + 1, total),
        }
    }
}

/// Library-level error type for Recap operations.
#[derive(Error, Debug)]
pub enum RecapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Content fetch failed: {0}")]
    Fetch(String),

    #[error("Generation backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend response at {stage} is missing a {marker} block")]
    ContractViolation { stage: Stage, marker: String },

    #[error("Conversation error: {0}")]
    Session(String),

    #[error("Speech synthesis failed: {0}")]
    Speech(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RecapError {
    /// The stage a contract violation occurred at, if this is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RecapError::ContractViolation { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias for Recap operations.
pub type Result<T> = std::result::Result<T, RecapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_names_stage() {
        let err = RecapError::ContractViolation {
            stage: Stage::Reduce { index: 1, total: 3 },
            marker: "<final_script>".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backend response at reduce batch 2/3 is missing a <final_script> block"
        );
        assert_eq!(err.stage(), Some(Stage::Reduce { index: 1, total: 3 }));
    }

    #[test]
    fn test_map_stage_display() {
        let stage = Stage::Map { index: 0, total: 4 };
        assert_eq!(stage.to_string(), "map chunk 1/4");
    }
}
