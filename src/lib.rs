//! Recap - condense long reads into listenable scripts
//!
//! Recap fetches an article, a YouTube transcript or a text file, condenses
//! it into a script meant to be heard rather than read, and keeps the result
//! around for follow-up questions.
//!
//! # Overview
//!
//! Recap allows you to:
//! - Condense content of any length with a map-reduce pass over a language model
//! - Read the condensed script aloud through a text-to-speech endpoint
//! - Ask follow-up questions about what you just heard
//! - Serve all of the above over HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `source` - Content sources (web articles, YouTube transcripts, text files)
//! - `chunking` - Recursive character splitting
//! - `backend` - Generative text backends
//! - `condense` - Map-reduce condensation and output validation
//! - `conversation` - Question answering sessions
//! - `speech` - Text-to-speech
//! - `archive` - Saved scripts
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use recap::config::Settings;
//! use recap::orchestrator::{Orchestrator, ProcessOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator
//!         .process("https://example.com/news/story", ProcessOptions::default())
//!         .await?;
//!     println!("{}", result.text);
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod backend;
pub mod chunking;
pub mod cli;
pub mod condense;
pub mod config;
pub mod conversation;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod source;
pub mod speech;

pub use error::{RecapError, Result};
