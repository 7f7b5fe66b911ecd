//! Split command: preview chunking without calling a model.

use crate::chunking::{RecursiveSplitter, SplitConfig};
use crate::cli::Output;
use crate::config::{CondenseSettings, Settings};
use anyhow::Result;

/// Run the split command.
pub fn run_split(
    file: &str,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    settings: &Settings,
) -> Result<()> {
    let condense = CondenseSettings {
        chunk_size: chunk_size.unwrap_or(settings.condense.chunk_size),
        chunk_overlap: chunk_overlap.unwrap_or(settings.condense.chunk_overlap),
        ..settings.condense.clone()
    };
    condense.validate()?;

    let path = Settings::expand_path(file);
    let text = std::fs::read_to_string(&path)?;
    let chunks = RecursiveSplitter::new(SplitConfig::from(&condense)).split(&text);

    let batches = chunks.len().div_ceil(condense.reduce_batch_size.max(1));

    Output::header(&format!("{}", path.display()));
    Output::kv("Characters", &text.chars().count().to_string());
    Output::kv(
        "Chunk size",
        &format!("{} (overlap {})", condense.chunk_size, condense.chunk_overlap),
    );
    Output::kv("Chunks", &chunks.len().to_string());
    Output::kv("Reduce batches", &batches.to_string());
    Output::kv(
        "Backend calls",
        &(chunks.len() + batches).to_string(),
    );
    println!();

    for chunk in &chunks {
        Output::chunk_info(chunk.index, chunk.char_len(), chunk.start, chunk.end, &chunk.text);
    }

    Ok(())
}
