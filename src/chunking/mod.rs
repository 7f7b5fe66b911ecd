//! Splitting raw content into bounded, overlapping chunks.
//!
//! Chunks are the unit of work for the map stage. Each one is a contiguous
//! slice of the source text, at most `chunk_size` characters long, and
//! shares roughly `chunk_overlap` characters with its predecessor so facts
//! cut at a boundary survive in at least one chunk.

mod recursive;

pub use recursive::RecursiveSplitter;

use crate::config::CondenseSettings;
use serde::{Deserialize, Serialize};

/// A chunk of source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the source, starting at 0.
    pub index: usize,
    /// Text content of this chunk.
    pub text: String,
    /// Byte offset of the first character in the source.
    pub start: usize,
    /// Byte offset one past the last character in the source.
    pub end: usize,
}

impl Chunk {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Configuration for splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk to the next.
    pub chunk_overlap: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            chunk_overlap: 200,
        }
    }
}

impl From<&CondenseSettings> for SplitConfig {
    fn from(settings: &CondenseSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}
