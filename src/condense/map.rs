//! Map stage: condense every chunk independently.

use super::contract::MarkerPair;
use crate::backend::{complete, Backend, GenerationMode};
use crate::chunking::Chunk;
use crate::config::Prompts;
use crate::error::{RecapError, Result, Stage};
use tracing::{debug, info};

/// Condense each chunk in order, returning one validated result per chunk.
///
/// Calls are made one at a time in chunk order. The first backend failure
/// or contract violation aborts the stage and nothing is returned.
pub async fn map_chunks(
    backend: &dyn Backend,
    prompts: &Prompts,
    markers: &MarkerPair,
    chunks: &[Chunk],
    mode: GenerationMode,
) -> Result<Vec<String>> {
    let total = chunks.len();
    info!("Starting map stage over {} chunks", total);

    let mut results = Vec::with_capacity(total);

    for (index, chunk) in chunks.iter().enumerate() {
        let stage = Stage::Map { index, total };
        debug!("Condensing {} ({} chars)", stage, chunk.char_len());

        let prompt = prompts.map_prompt(&chunk.text);
        let raw = complete(backend, &prompt, mode)
            .await
            .map_err(|e| at_stage(e, stage))?;
        debug!("{} returned {} chars", stage, raw.len());

        let condensed = markers.require(&raw, stage)?;
        debug!("{} condensed to {} chars", stage, condensed.len());
        results.push(condensed);
    }

    info!("Map stage complete: {} results", results.len());
    Ok(results)
}

/// Attach the pipeline stage to backend failures.
pub(crate) fn at_stage(err: RecapError, stage: Stage) -> RecapError {
    match err {
        RecapError::BackendUnavailable(msg) => {
            RecapError::BackendUnavailable(format!("{}: {}", stage, msg))
        }
        other => other,
    }
}
