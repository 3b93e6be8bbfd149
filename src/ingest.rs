//! Ingestion pipeline orchestration.
//!
//! Coordinates the flow from a transcript source to a queryable index:
//! source → cleaning → validation → chunking → embedding → [`FlatIndex`].
//! Chunks are embedded in `batch_size` batches; each batch is appended to
//! the index atomically.

use anyhow::{bail, Result};
use tracing::{debug, info};

use transcript_search_core::error::{IndexError, Stage};
use transcript_search_core::search::QueryPipeline;
use transcript_search_core::store::memory::FlatIndex;
use transcript_search_core::store::VectorIndex;

use crate::embedding::EmbeddingProvider;
use crate::models::{Chunk, TimedEntry};
use crate::transcript::TranscriptSource;

/// Fetch entries from a source, tagging failures as fetch-stage errors.
pub fn fetch_entries(source: &dyn TranscriptSource) -> Result<Vec<TimedEntry>> {
    let entries = source
        .fetch()
        .map_err(|e| IndexError::upstream(Stage::Fetch, e))?;
    debug!(source = source.name(), entries = entries.len(), "fetched transcript");
    Ok(entries)
}

/// Embed `chunks` and load them into a fresh [`FlatIndex`].
///
/// The index dimension is taken from `provider.dims()`. Every entry's
/// metadata carries the chunk fields plus `source` when given.
pub fn build_index<E: EmbeddingProvider>(
    provider: E,
    chunks: &[Chunk],
    source: Option<&str>,
    batch_size: usize,
) -> Result<QueryPipeline<E, FlatIndex>> {
    if batch_size == 0 {
        bail!("batch_size must be > 0");
    }
    let dims = provider.dims();
    if dims == 0 {
        bail!(
            "Embedding provider '{}' has no vector dimension; configure [embedding] first",
            provider.model_name()
        );
    }

    let mut pipeline = QueryPipeline::new(provider, FlatIndex::new(dims)?);

    for (n, batch) in chunks.chunks(batch_size).enumerate() {
        let added = pipeline.index_chunks(batch, source)?;
        debug!(batch = n, added, "embedded batch");
    }

    info!(
        chunks = pipeline.index().len(),
        dims,
        model = pipeline.provider().model_name(),
        "index built"
    );
    Ok(pipeline)
}
