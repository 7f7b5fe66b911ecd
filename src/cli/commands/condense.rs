//! Condense command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, ProcessOptions};
use anyhow::Result;

/// Run the condense command.
pub async fn run_condense(
    input: &str,
    speak: bool,
    save: bool,
    model: Option<String>,
    json: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.backend.model = model;
    }

    if let Err(e) = preflight::check(Operation::condense_input(input), &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'recap doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    if speak {
        if let Err(e) = preflight::check(Operation::Speak, &settings) {
            Output::warning(&format!("Speech may fail: {}", e));
        }
    }

    if !json {
        Output::info(&format!("Processing: {}", input));
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = (!json).then(|| Output::spinner("Condensing..."));
    let result = orchestrator
        .process(input, ProcessOptions { speak, save })
        .await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("Failed to condense: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    Output::header(&result.title);
    println!("\n{}\n", result.text);

    Output::success(&format!(
        "Condensed {} chars into {} chars ({} chunks)",
        result.original_chars, result.condensed_chars, result.chunks
    ));
    Output::kv("Source", &result.source_url);
    if let Some(path) = &result.audio_path {
        Output::kv("Audio", &path.display().to_string());
    }
    if let Some(path) = &result.script_path {
        Output::kv("Script", &path.display().to_string());
    }
    if let Some(error) = &result.speech_error {
        Output::warning(&format!("Speech synthesis failed: {}", error));
    }

    Ok(())
}
