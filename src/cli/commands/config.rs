//! Config command: inspect and edit the settings file.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Run the config command against `config_path`, or the default location.
pub fn run_config(action: &ConfigAction, config_path: Option<&str>, settings: Settings) -> Result<()> {
    let path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => show(&path, &settings),
        ConfigAction::Edit => edit(&path, &settings),
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn show(path: &Path, settings: &Settings) -> Result<()> {
    let file = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };

    Output::header("Effective configuration");
    Output::kv("File", &file);
    for (key, value) in effective_values(settings) {
        Output::kv(key, &value);
    }
    if let Err(e) = settings.condense.validate() {
        Output::warning(&e.to_string());
    }

    println!();
    let toml_str = toml::to_string_pretty(settings).context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

/// Values the pipeline runs with, after defaults and `RECAP_*` overrides.
fn effective_values(settings: &Settings) -> Vec<(&'static str, String)> {
    let backend = &settings.backend;
    let key_env = backend.api_key_env();
    let key_state = match std::env::var(&key_env) {
        Ok(key) if !key.is_empty() => "set",
        _ if backend.provider.requires_api_key() => "missing",
        _ => "not required",
    };
    let condense = &settings.condense;
    let speech = &settings.speech;

    vec![
        ("Provider", backend.provider.to_string()),
        ("API base", backend.api_base()),
        ("API key", format!("${} ({})", key_env, key_state)),
        ("Model", backend.model.clone()),
        ("Conversation model", settings.conversation_model().to_string()),
        (
            "Chunks",
            format!("{} chars, overlap {}", condense.chunk_size, condense.chunk_overlap),
        ),
        ("Reduce batch size", condense.reduce_batch_size.to_string()),
        ("Context cap", format!("{} chars", condense.context_cap)),
        (
            "History window",
            format!("{} exchanges", settings.conversation.window_turns),
        ),
        (
            "Speech",
            format!("{} voice {} as {}", speech.model, speech.voice, speech.format),
        ),
        ("Output", settings.output_dir().display().to_string()),
    ]
}

fn edit(path: &Path, settings: &Settings) -> Result<()> {
    if !path.exists() {
        settings.save_to(&path.to_path_buf())?;
        Output::info(&format!("Created {}", path.display()));
    }

    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .unwrap_or_else(|_| "vi".to_string());
    Output::info(&format!("Opening {} in {}...", path.display(), editor));

    let status = std::process::Command::new(&editor)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to start {} (config file is at {})", editor, path.display()))?;
    if !status.success() {
        Output::warning(&format!("{} exited with {}", editor, status));
    }

    match check_file(path) {
        Ok(()) => Output::success("Config is valid."),
        Err(problem) => Output::warning(&format!("Config needs fixing: {}", problem)),
    }
    Ok(())
}

/// Re-read `path` and report why recap could not run with it.
fn check_file(path: &Path) -> std::result::Result<(), String> {
    let reloaded = Settings::load_from(Some(&PathBuf::from(path))).map_err(|e| e.to_string())?;
    reloaded.condense.validate().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendProvider;

    fn value<'a>(values: &'a [(&'static str, String)], key: &str) -> &'a str {
        values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_effective_values_resolve_provider_defaults() {
        let mut settings = Settings::default();
        settings.backend.provider = BackendProvider::Ollama;
        settings.backend.api_key_env = Some("RECAP_TEST_UNSET_KEY".to_string());
        settings.condense.chunk_size = 4_000;

        let values = effective_values(&settings);
        assert_eq!(value(&values, "API base"), "http://localhost:11434/v1");
        assert_eq!(value(&values, "API key"), "$RECAP_TEST_UNSET_KEY (not required)");
        assert_eq!(value(&values, "Chunks"), "4000 chars, overlap 200");
        assert_eq!(value(&values, "Conversation model"), settings.backend.model);
    }

    #[test]
    fn test_missing_key_is_reported() {
        let mut settings = Settings::default();
        settings.backend.api_key_env = Some("RECAP_TEST_UNSET_KEY".to_string());

        let values = effective_values(&settings);
        assert_eq!(value(&values, "API key"), "$RECAP_TEST_UNSET_KEY (missing)");
    }

    #[test]
    fn test_check_file() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[condense]\nreduce_batch_size = 3\n").unwrap();
        assert!(check_file(&good).is_ok());

        let bad_knobs = dir.path().join("knobs.toml");
        std::fs::write(&bad_knobs, "[condense]\nchunk_overlap = 20000\n").unwrap();
        assert!(check_file(&bad_knobs).unwrap_err().contains("chunk_overlap"));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[condense\n").unwrap();
        assert!(check_file(&broken).unwrap_err().starts_with("TOML parse error"));
    }
}
