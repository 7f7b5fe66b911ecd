//! Configuration module for Recap.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    ConversationPrompts, CondensePrompts, Prompts, SCRIPT_CLOSE, SCRIPT_OPEN,
};
pub use settings::{
    BackendProvider, BackendSettings, CondenseSettings, ConversationSettings, GeneralSettings,
    PromptSettings, Settings, SpeechSettings,
};
