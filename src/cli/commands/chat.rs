//! Interactive chat about condensed content.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, ProcessOptions};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(
    input: &str,
    model: Option<String>,
    speak: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.conversation.model = Some(model);
    }

    if let Err(e) = preflight::check(Operation::condense_input(input), &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'recap doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!("Loading: {}", input));
    let spinner = Output::spinner("Condensing...");
    let result = orchestrator.process(input, ProcessOptions::default()).await;
    spinner.finish_and_clear();
    let result = result?;

    Output::header(&result.title);
    println!("\n{}\n", result.text);

    let conversation = orchestrator.conversation();
    let mut session = conversation.start(&result.text);

    println!("\n{}", style("Recap Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the content, or 'exit' to quit. Use 'clear' to reset the conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session = conversation.start(&result.text);
            Output::info("Conversation history cleared.");
            continue;
        }

        match conversation.ask(&mut session, input).await {
            Ok(answer) => {
                println!("\n{} {}\n", style("Recap:").cyan().bold(), answer);
                if speak {
                    match orchestrator.speak(&answer).await {
                        Ok(path) => Output::kv("Audio", &path.display().to_string()),
                        Err(e) => Output::warning(&format!("Speech synthesis failed: {}", e)),
                    }
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
