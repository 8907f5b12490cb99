//! Chunk command handler

use anyhow::Result;
use serde_json::Value;

use fieldcat::chunking::{ChunkingResult, FieldFilter, SemanticChunker, DEFAULT_ARRAY_SAMPLE_SIZE};
use fieldcat::config::{ChunkingConfig, Config};

use super::{print_json, read_document};

/// Split a document into byte-bounded chunks and print them as JSON.
#[cfg(not(tarpaulin_include))]
pub fn handle(file: &str, max_size: Option<usize>) -> Result<()> {
    let config = Config::load()?;
    let document = read_document(file)?;
    let result = run(&config.chunking, &document, max_size)?;
    tracing::info!(
        chunks = result.stats.total_chunks,
        fields = result.stats.total_fields,
        "chunked document"
    );
    print_json(&result)
}

/// Chunker configured from the `[chunking]` section.
pub(crate) fn chunker(config: &ChunkingConfig, max_size: Option<usize>) -> Result<SemanticChunker> {
    let max_chunk_size = max_size.unwrap_or(config.max_chunk_size);
    if max_chunk_size < 64 {
        anyhow::bail!("--max-size must be at least 64 bytes");
    }
    Ok(SemanticChunker::new(
        max_chunk_size,
        FieldFilter::new(config.skip_fields.clone()),
        DEFAULT_ARRAY_SAMPLE_SIZE,
    ))
}

pub(crate) fn run(
    config: &ChunkingConfig,
    document: &Value,
    max_size: Option<usize>,
) -> Result<ChunkingResult> {
    Ok(chunker(config, max_size)?.chunk(document))
}
