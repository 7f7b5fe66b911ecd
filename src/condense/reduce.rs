//! Reduce stage: merge map results into the final script.
//!
//! Up to `batch_size` results are merged in one call. Longer sequences are
//! cut into contiguous batches that are reduced one after another, each
//! later batch seeing the tail of the batch before it so the script reads
//! as one piece.

use super::contract::MarkerPair;
use super::map::at_stage;
use crate::backend::{complete, Backend, GenerationMode};
use crate::config::Prompts;
use crate::error::{Result, Stage};
use tracing::{debug, info};

/// Separator between map results inside one reduce prompt.
pub const RESULT_SEPARATOR: &str = "\n\n---\n\n";

/// Separator between reduced batches in the final script.
pub const BATCH_SEPARATOR: &str = "\n\n";

/// Batching knobs for the reduce stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceConfig {
    /// Maximum map results merged per call.
    pub batch_size: usize,
    /// Maximum characters of the previous batch shown to the next one.
    pub context_cap: usize,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            context_cap: 3_000,
        }
    }
}

/// Merge `results` into the final condensed text.
pub async fn reduce_results(
    backend: &dyn Backend,
    prompts: &Prompts,
    markers: &MarkerPair,
    results: &[String],
    config: ReduceConfig,
    mode: GenerationMode,
) -> Result<String> {
    let batch_size = config.batch_size.max(1);

    if results.len() <= batch_size {
        info!("Reducing {} results in a single call", results.len());
        let stage = Stage::Reduce { index: 0, total: 1 };
        let prompt = prompts.reduce_prompt(&results.join(RESULT_SEPARATOR));
        let raw = complete(backend, &prompt, mode)
            .await
            .map_err(|e| at_stage(e, stage))?;
        let reduced = markers.require(&raw, stage)?;
        info!("Reduce complete: {} chars", reduced.len());
        return Ok(reduced);
    }

    let total = results.len().div_ceil(batch_size);
    info!(
        "Reducing {} results in {} batches of up to {}",
        results.len(),
        total,
        batch_size
    );

    let mut reduced_batches: Vec<String> = Vec::with_capacity(total);

    for (index, batch) in results.chunks(batch_size).enumerate() {
        let stage = Stage::Reduce { index, total };
        let combined = batch.join(RESULT_SEPARATOR);
        debug!("{}: {} results, {} chars", stage, batch.len(), combined.len());

        let prompt = match reduced_batches.last() {
            None => prompts.reduce_prompt(&combined),
            Some(previous) => {
                let context = tail_chars(previous, config.context_cap);
                debug!("{} continues from {} chars of context", stage, context.len());
                prompts.reduce_with_context_prompt(context, &combined)
            }
        };

        let raw = complete(backend, &prompt, mode)
            .await
            .map_err(|e| at_stage(e, stage))?;
        let reduced = markers.require(&raw, stage)?;
        info!("{} reduced to {} chars", stage, reduced.len());
        reduced_batches.push(reduced);
    }

    let joined = reduced_batches.join(BATCH_SEPARATOR);
    info!("All batches combined: {} chars", joined.len());
    Ok(joined)
}

/// The last `max_chars` characters of `text`.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
