//! CLI module for Recap.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Recap - condense long reads into listenable scripts
///
/// Fetches an article, video transcript or text file, condenses it with a
/// map-reduce pass over a language model, and optionally reads it aloud or
/// lets you ask questions about it.
#[derive(Parser, Debug)]
#[command(name = "recap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Condense an article, YouTube video or text file
    Condense {
        /// Web URL, YouTube URL/ID, or local text file path
        input: String,

        /// Synthesize speech for the condensed script
        #[arg(short, long)]
        speak: bool,

        /// Save the condensed script to the output directory
        #[arg(long)]
        save: bool,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Condense content, then ask questions about it interactively
    Chat {
        /// Web URL, YouTube URL/ID, or local text file path
        input: String,

        /// LLM model to use for answers
        #[arg(short, long)]
        model: Option<String>,

        /// Read answers aloud (saved as audio files)
        #[arg(short, long)]
        speak: bool,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Show how a text file would be chunked, without calling a model
    Split {
        /// Text file to split
        file: String,

        /// Chunk size in characters (defaults to configuration)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Overlap between chunks in characters (defaults to configuration)
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Cli {
    /// Log level for the `recap` target. Without `-v` the configured level
    /// applies; each `-v` steps up from info to trace.
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        match self.verbose {
            0 => configured,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_condense() {
        let cli = Cli::parse_from(["recap", "condense", "https://example.com", "--speak", "-m", "gpt-4o"]);
        match cli.command {
            Commands::Condense {
                input,
                speak,
                save,
                model,
                json,
            } => {
                assert_eq!(input, "https://example.com");
                assert!(speak);
                assert!(!save);
                assert!(!json);
                assert_eq!(model.as_deref(), Some("gpt-4o"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::parse_from(["recap", "-v", "serve"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 3000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_steps_up_from_configured_level() {
        let level = |args: &[&str]| {
            let cli = Cli::parse_from(args);
            cli.log_level("warn").to_string()
        };
        assert_eq!(level(&["recap", "doctor"]), "warn");
        assert_eq!(level(&["recap", "-v", "doctor"]), "info");
        assert_eq!(level(&["recap", "-vv", "doctor"]), "debug");
        assert_eq!(level(&["recap", "-vvvv", "doctor"]), "trace");
    }

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
