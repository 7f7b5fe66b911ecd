//! Output contract between the pipeline and a generative backend.
//!
//! Every pipeline prompt asks the backend to put its authoritative answer
//! between a begin and an end marker. Backends may think out loud before
//! answering, and may even quote the markers while doing so, so only the
//! last begin marker and the last end marker count.

use crate::config::{SCRIPT_CLOSE, SCRIPT_OPEN};
use crate::error::{RecapError, Result, Stage};
use tracing::{debug, warn};

/// Result of checking one backend response against the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Text between the markers, or the whole trimmed response if none were found.
    pub text: String,
    /// Whether a matched, ordered marker pair was found.
    pub found: bool,
}

/// Begin/end marker pair, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct MarkerPair {
    open: String,
    close: String,
}

impl Default for MarkerPair {
    fn default() -> Self {
        Self::new(SCRIPT_OPEN, SCRIPT_CLOSE)
    }
}

impl MarkerPair {
    pub fn new(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }

    /// Extract the text between the last begin marker and the last end marker.
    pub fn extract(&self, raw: &str) -> Extraction {
        let open = rfind_ignore_ascii_case(raw, &self.open);
        let close = rfind_ignore_ascii_case(raw, &self.close);

        match (open, close) {
            (Some(open), Some(close)) if close > open => {
                let start = open + self.open.len();
                if close < start {
                    return self.missing(raw);
                }
                let text = raw[start..close].trim().to_string();
                debug!(
                    "Extracted {} chars from {} marker (discarded {} chars)",
                    text.len(),
                    self.open,
                    raw.len() - text.len()
                );
                Extraction { text, found: true }
            }
            _ => self.missing(raw),
        }
    }

    /// Extract the payload or fail with a contract violation at `stage`.
    pub fn require(&self, raw: &str, stage: Stage) -> Result<String> {
        let extraction = self.extract(raw);
        if extraction.found {
            Ok(extraction.text)
        } else {
            Err(RecapError::ContractViolation {
                stage,
                marker: self.open.clone(),
            })
        }
    }

    fn missing(&self, raw: &str) -> Extraction {
        warn!(
            "No valid {}...{} pair in {} char response: {:?}",
            self.open,
            self.close,
            raw.len(),
            preview(raw, 300)
        );
        Extraction {
            text: raw.trim().to_string(),
            found: false,
        }
    }
}

/// Extract the `<final_script>` payload from a backend response.
pub fn extract_script(raw: &str) -> Extraction {
    MarkerPair::default().extract(raw)
}

/// Byte offset of the last ASCII-case-insensitive occurrence of `needle`.
fn rfind_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }

    (0..=hay.len() - needle.len())
        .rev()
        .find(|&i| haystack.is_char_boundary(i) && hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pair() {
        let out = extract_script("thinking...\n<final_script>\n  The answer.  \n</final_script>\n");
        assert_eq!(
            out,
            Extraction {
                text: "The answer.".to_string(),
                found: true
            }
        );
    }

    #[test]
    fn test_last_pair_wins() {
        let raw = "I will write <final_script>draft</final_script> and then \
                   <final_script>real answer</final_script>";
        let out = extract_script(raw);
        assert!(out.found);
        assert_eq!(out.text, "real answer");
    }

    #[test]
    fn test_markers_echoed_in_reasoning_before_answer() {
        let raw = "The format wants a <final_script> tag, closed by </final_script>. \
                   Let me answer.\n<FINAL_SCRIPT>Spoken text.</Final_Script>";
        let out = extract_script(raw);
        assert!(out.found);
        assert_eq!(out.text, "Spoken text.");
    }

    #[test]
    fn test_missing_markers_fail() {
        let out = extract_script("  Just prose about a final script, no tags.  ");
        assert!(!out.found);
        assert_eq!(out.text, "Just prose about a final script, no tags.");
    }

    #[test]
    fn test_end_before_begin_fails() {
        let out = extract_script("</final_script> oops <final_script> unterminated");
        assert!(!out.found);
    }

    #[test]
    fn test_only_begin_marker_fails() {
        assert!(!extract_script("<final_script>never closed").found);
        assert!(!extract_script("").found);
    }

    #[test]
    fn test_require_reports_stage() {
        let stage = Stage::Map { index: 2, total: 5 };
        let err = MarkerPair::default().require("no tags", stage).unwrap_err();
        assert_eq!(err.stage(), Some(stage));

        let ok = MarkerPair::default()
            .require("<final_script>x</final_script>", stage)
            .unwrap();
        assert_eq!(ok, "x");
    }

    #[test]
    fn test_custom_markers_and_unicode() {
        let pair = MarkerPair::new("[[begin]]", "[[end]]");
        let out = pair.extract("İstanbul notes [[BEGIN]] çok güzel [[End]] trailing");
        assert!(out.found);
        assert_eq!(out.text, "çok güzel");
    }

    #[test]
    fn test_violation_names_the_pair_in_use() {
        let pair = MarkerPair::new("[[begin]]", "[[end]]");
        let err = pair
            .require("<final_script>x</final_script>", Stage::Map { index: 0, total: 1 })
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Backend response at map chunk 1/1 is missing a [[begin]] block"
        );
    }

    #[test]
    fn test_empty_payload_is_still_a_pair() {
        let out = extract_script("<final_script></final_script>");
        assert!(out.found);
        assert_eq!(out.text, "");
    }
}
