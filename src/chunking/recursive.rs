//! Recursive structural splitter.
//!
//! Tries paragraph breaks first, then line breaks, then spaces, and finally
//! individual characters, recursing into any piece that is still too long.

use super::{Chunk, SplitConfig};
use std::collections::VecDeque;
use std::ops::Range;
use tracing::debug;

/// Separators tried in order. The empty separator means "between characters".
const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text at the coarsest structural boundary that yields pieces
/// shorter than the chunk size, then packs pieces into chunks.
pub struct RecursiveSplitter {
    config: SplitConfig,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self {
            config,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Use a custom separator hierarchy (coarsest first).
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Split `text` into ordered chunks. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();
        self.split_span(text, 0..text.len(), &self.separators, &mut spans);

        let chunks: Vec<Chunk> = spans
            .into_iter()
            .enumerate()
            .map(|(index, span)| Chunk {
                index,
                text: text[span.clone()].to_string(),
                start: span.start,
                end: span.end,
            })
            .collect();

        debug!(
            "Split {} chars into {} chunks (size={}, overlap={})",
            text.chars().count(),
            chunks.len(),
            self.config.chunk_size,
            self.config.chunk_overlap
        );

        chunks
    }

    fn split_span(
        &self,
        text: &str,
        span: Range<usize>,
        separators: &[String],
        out: &mut Vec<Range<usize>>,
    ) {
        let slice = &text[span.clone()];

        // First separator present in this slice; anything after it is for recursion.
        let (separator, remaining) = match separators
            .iter()
            .position(|s| s.is_empty() || slice.contains(s.as_str()))
        {
            Some(i) => (separators[i].as_str(), &separators[i + 1..]),
            None => ("", &separators[separators.len()..]),
        };

        let mut good: Vec<(Range<usize>, usize)> = Vec::new();

        for piece in pieces(slice, separator) {
            let piece = (span.start + piece.start)..(span.start + piece.end);
            let len = text[piece.clone()].chars().count();

            if len < self.config.chunk_size {
                good.push((piece, len));
                continue;
            }

            if !good.is_empty() {
                self.merge(&good, out);
                good.clear();
            }

            if remaining.is_empty() {
                out.push(piece);
            } else {
                self.split_span(text, piece, remaining, out);
            }
        }

        if !good.is_empty() {
            self.merge(&good, out);
        }
    }

    /// Pack contiguous pieces into chunks, keeping up to `chunk_overlap`
    /// trailing characters of each chunk at the head of the next.
    fn merge(&self, pieces: &[(Range<usize>, usize)], out: &mut Vec<Range<usize>>) {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut window: VecDeque<&(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = piece.1;

            if total + len > size && !window.is_empty() {
                out.push(span_of(&window));

                while total > overlap || (total + len > size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        if !window.is_empty() {
            out.push(span_of(&window));
        }
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self::new(SplitConfig::default())
    }
}

fn span_of(window: &VecDeque<&(Range<usize>, usize)>) -> Range<usize> {
    match (window.front(), window.back()) {
        (Some(first), Some(last)) => first.0.start..last.0.end,
        _ => 0..0,
    }
}

/// Cut `slice` before every occurrence of `separator`, keeping the separator
/// at the start of the following piece. Empty pieces are dropped.
fn pieces(slice: &str, separator: &str) -> Vec<Range<usize>> {
    let mut bounds: Vec<usize> = if separator.is_empty() {
        slice.char_indices().map(|(i, _)| i).collect()
    } else {
        let mut b = vec![0];
        b.extend(slice.match_indices(separator).map(|(i, _)| i).filter(|&i| i > 0));
        b
    };
    bounds.push(slice.len());
    bounds.dedup();

    bounds
        .windows(2)
        .map(|w| w[0]..w[1])
        .filter(|r| !r.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(size: usize, overlap: usize) -> RecursiveSplitter {
        RecursiveSplitter::new(SplitConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        })
    }

    /// Chunks must start at 0, end at the end, and never leave a gap.
    fn assert_covers(text: &str, chunks: &[Chunk]) {
        assert_eq!(chunks.first().unwrap().start, 0);
        assert_eq!(chunks.last().unwrap().end, text.len());
        for pair in chunks.windows(2) {
            assert!(
                pair[1].start <= pair[0].end,
                "gap between chunk {} and {}",
                pair[0].index,
                pair[1].index
            );
        }
        for chunk in chunks {
            assert_eq!(&text[chunk.start..chunk.end], chunk.text);
        }
    }

    fn words(count: usize) -> String {
        (0..count)
            .map(|i| format!("word{}", i % 97))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_empty_input() {
        assert!(splitter(100, 10).split("").is_empty());
    }

    #[test]
    fn test_short_input_is_single_chunk() {
        let chunks = splitter(100, 10).split("A short note.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A short note.");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_default_sizes_on_long_prose() {
        let text: String = words(6000).chars().take(25_000).collect();
        assert_eq!(text.chars().count(), 25_000);

        let chunks = RecursiveSplitter::default().split(&text);
        assert_eq!(chunks.len(), 3);
        assert_covers(&text, &chunks);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 10_000);
        }
    }

    #[test]
    fn test_neighbours_overlap() {
        let text = words(400);
        let chunks = splitter(300, 50).split(&text);
        assert!(chunks.len() > 2);
        assert_covers(&text, &chunks);

        for pair in chunks.windows(2) {
            let shared = pair[0].end.saturating_sub(pair[1].start);
            assert!(shared > 0, "chunks should share text");
            assert!(shared <= 50);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let para = "x".repeat(40);
        let text = format!("{para}\n\n{para}\n\n{para}");
        let chunks = splitter(50, 0).split(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, para);
        assert_eq!(chunks[1].text, format!("\n\n{para}"));
        assert_covers(&text, &chunks);
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let text = "a".repeat(25_000);
        let chunks = RecursiveSplitter::default().split(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].char_len(), 10_000);
        assert_eq!(chunks[1].start, 9_800);
        assert_covers(&text, &chunks);
    }

    #[test]
    fn test_multibyte_text_respects_char_bounds() {
        let text = "héllo wörld ünïcode ".repeat(50);
        let chunks = splitter(64, 8).split(&text);
        assert_covers(&text, &chunks);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 64);
        }
    }

    #[test]
    fn test_bound_holds_with_long_words() {
        let text = format!("short {} tail", "z".repeat(130));
        let chunks = splitter(50, 5).split(&text);
        assert_covers(&text, &chunks);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 50, "chunk {} too long", chunk.index);
        }
    }

    #[test]
    fn test_pieces_keep_separator_in_front() {
        let got: Vec<_> = pieces("a b  c", " ")
            .into_iter()
            .map(|r| &"a b  c"[r])
            .collect();
        assert_eq!(got, vec!["a", " b", " ", " c"]);
    }
}
