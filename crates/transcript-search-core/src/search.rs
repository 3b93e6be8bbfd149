//! Query pipeline: embed the query, search the index, return ranked chunks.
//!
//! The pipeline owns an [`EmbeddingProvider`] and a [`VectorIndex`] and
//! wires them together for both directions of the data flow:
//!
//! ```text
//! chunks ──embed──▶ vectors ──add──▶ index
//! query  ──embed──▶ vector  ──search──▶ ranked SearchResults
//! ```
//!
//! Embedding failures are reported as
//! [`IndexError::UpstreamFailure`] with [`Stage::Embed`]; index failures
//! pass through unchanged.

use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::{IndexError, Result, Stage};
use crate::models::{Chunk, Metadata, SearchResult};
use crate::store::VectorIndex;

/// Embed a single query text.
///
/// Makes exactly one provider call with one text and expects exactly one
/// vector back. The text is passed through unchanged, even when empty.
pub fn embed_query<E: EmbeddingProvider + ?Sized>(provider: &E, text: &str) -> Result<Vec<f32>> {
    let vectors = provider
        .embed(&[text.to_string()])
        .map_err(|e| IndexError::upstream(Stage::Embed, e))?;

    if vectors.len() != 1 {
        return Err(IndexError::upstream(
            Stage::Embed,
            anyhow::anyhow!("expected 1 query vector, got {}", vectors.len()),
        ));
    }
    Ok(vectors.into_iter().next().unwrap_or_default())
}

/// Embedding provider and vector index bundled for indexing and querying.
pub struct QueryPipeline<E, I> {
    provider: E,
    index: I,
}

impl<E: EmbeddingProvider, I: VectorIndex> QueryPipeline<E, I> {
    pub fn new(provider: E, index: I) -> Self {
        Self { provider, index }
    }

    pub fn provider(&self) -> &E {
        &self.provider
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn into_index(self) -> I {
        self.index
    }

    /// Embed `chunks` in one provider call and append them to the index.
    ///
    /// Each entry's metadata is [`Chunk::to_metadata`] plus a `source`
    /// label when one is given. Returns the number of entries added. On
    /// any failure the index is left untouched.
    pub fn index_chunks(&mut self, chunks: &[Chunk], source: Option<&str>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .provider
            .embed(&texts)
            .map_err(|e| IndexError::upstream(Stage::Embed, e))?;

        if vectors.len() != chunks.len() {
            return Err(IndexError::upstream(
                Stage::Embed,
                anyhow::anyhow!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    chunks.len()
                ),
            ));
        }

        let metadatas: Vec<Metadata> = chunks
            .iter()
            .map(|c| {
                let mut meta = c.to_metadata();
                if let Some(src) = source {
                    meta.insert("source".to_string(), src.into());
                }
                meta
            })
            .collect();

        self.index.add(vectors, metadatas)?;
        debug!(
            added = chunks.len(),
            total = self.index.len(),
            model = self.provider.model_name(),
            "indexed chunks"
        );
        Ok(chunks.len())
    }

    /// Return the `top_k` chunks most similar to `text`, best first.
    pub fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let query_vec = embed_query(&self.provider, text)?;
        let results = self.index.search(&query_vec, top_k)?;
        debug!(top_k, returned = results.len(), "query complete");
        Ok(results)
    }
}
