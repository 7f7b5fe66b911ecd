//! Recap CLI entry point.

use anyhow::Result;
use clap::Parser;
use recap::cli::{commands, Cli, Commands, Output};
use recap::config::Settings;
use recap::orchestrator::Orchestrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration; `config` still runs on an unreadable file so it can be fixed
    let loaded = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path))),
        None => Settings::load(),
    };
    let settings = match (loaded, &cli.command) {
        (Ok(settings), _) => settings,
        (Err(e), Commands::Config { .. }) => {
            Output::warning(&format!("{}; showing defaults", e));
            Settings::default()
        }
        (Err(e), _) => return Err(e.into()),
    };

    // Initialize logging; -v flags win over the configured level
    let log_level = cli.log_level(&settings.general.log_level);

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("recap={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.output_dir())?;

    // Execute command
    match &cli.command {
        Commands::Condense {
            input,
            speak,
            save,
            model,
            json,
        } => {
            commands::run_condense(input, *speak, *save, model.clone(), *json, settings).await?;
        }

        Commands::Chat {
            input,
            model,
            speak,
        } => {
            commands::run_chat(input, model.clone(), *speak, settings).await?;
        }

        Commands::Serve { host, port } => {
            let orchestrator = Orchestrator::new(settings)?;
            commands::run_serve(host, *port, orchestrator).await?;
        }

        Commands::Split {
            file,
            chunk_size,
            chunk_overlap,
        } => {
            commands::run_split(file, *chunk_size, *chunk_overlap, &settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
