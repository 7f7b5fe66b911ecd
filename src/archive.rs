//! Plain-text archive of condensed scripts.

use crate::error::Result;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

/// Longest file stem derived from a source URL.
const MAX_STEM_CHARS: usize = 100;

const RULE_WIDTH: usize = 80;

/// File stem for `source_url`: scheme dropped, everything but word
/// characters and `-` replaced by `_`, capped at 100 characters.
pub fn file_stem_for(source_url: &str) -> String {
    let url = source_url.trim();
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    without_scheme
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .take(MAX_STEM_CHARS)
        .collect()
}

/// Write `condensed` to a timestamped text file in `dir` and return its path.
pub async fn save_script(
    dir: &Path,
    source_url: &str,
    condensed: &str,
    audio_path: Option<&Path>,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let now = Local::now();
    let path = dir.join(format!(
        "{}_{}.txt",
        file_stem_for(source_url),
        now.format("%Y%m%d_%H%M%S")
    ));

    let rule = "=".repeat(RULE_WIDTH);
    let audio = audio_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "none".to_string());
    let body = format!(
        "Source URL: {}\nCreated: {}\n{}\n\n{}\n\n{}\nAudio File Path: {}\n",
        source_url,
        now.format("%Y-%m-%d %H:%M:%S"),
        rule,
        condensed,
        rule,
        audio
    );

    tokio::fs::write(&path, body).await?;
    info!("Script saved to {}", path.display());
    Ok(path)
}
