//! Flat exact in-memory [`VectorIndex`].
//!
//! Vectors are stored row-major in one contiguous `Vec<f32>`, with a
//! parallel `Vec<Metadata>` side-table. Search is a brute-force inner
//! product over every stored row: O(n·d) per query, exact top-k.
//!
//! Inputs are trusted to be unit-normalized (see
//! [`EmbeddingProvider`](crate::embedding::EmbeddingProvider)); the index
//! never normalizes or re-checks norms, so inner product is reported as
//! cosine similarity.

use std::cmp::Ordering;

use tracing::trace;

use crate::embedding::inner_product;
use crate::error::{IndexError, Result};
use crate::models::{Metadata, SearchResult};

use super::VectorIndex;

/// Flat exact inner-product index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dims: usize,
    /// Row-major storage, `len() * dims` values.
    vectors: Vec<f32>,
    metadata: Vec<Metadata>,
}

impl FlatIndex {
    /// Create an empty index for vectors of length `dims`.
    ///
    /// Fails with [`IndexError::InvalidInput`] when `dims` is zero.
    pub fn new(dims: usize) -> Result<Self> {
        if dims == 0 {
            return Err(IndexError::InvalidInput(
                "embedding dimension must be > 0".to_string(),
            ));
        }
        Ok(Self {
            dims,
            vectors: Vec::new(),
            metadata: Vec::new(),
        })
    }

    /// Stored vector at position `i`.
    pub fn vector(&self, i: usize) -> Option<&[f32]> {
        if i >= self.metadata.len() {
            return None;
        }
        Some(&self.vectors[i * self.dims..(i + 1) * self.dims])
    }

    /// Stored metadata at position `i`.
    pub fn metadata(&self, i: usize) -> Option<&Metadata> {
        self.metadata.get(i)
    }

    fn check_aligned(&self) {
        debug_assert_eq!(
            self.vectors.len(),
            self.metadata.len() * self.dims,
            "vector storage and metadata side-table out of alignment"
        );
    }
}

impl VectorIndex for FlatIndex {
    fn dims(&self) -> usize {
        self.dims
    }

    fn len(&self) -> usize {
        self.metadata.len()
    }

    fn add(&mut self, vectors: Vec<Vec<f32>>, metadatas: Vec<Metadata>) -> Result<()> {
        if vectors.len() != metadatas.len() {
            return Err(IndexError::LengthMismatch {
                vectors: vectors.len(),
                metadatas: metadatas.len(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dims) {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims,
                actual: bad.len(),
            });
        }
        if vectors.is_empty() {
            return Ok(());
        }

        // All checks passed; nothing below can fail.
        self.vectors.reserve(vectors.len() * self.dims);
        for v in &vectors {
            self.vectors.extend_from_slice(v);
        }
        self.metadata.extend(metadatas);
        self.check_aligned();

        trace!(added = vectors.len(), total = self.len(), "flat index add");
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.dims {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }
        if top_k == 0 {
            return Err(IndexError::InvalidInput("top_k must be >= 1".to_string()));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dims)
            // `+ 0.0` folds -0.0 into +0.0 so both rank as the same tie.
            .map(|row| inner_product(query, row) + 0.0)
            .enumerate()
            .collect();

        let k = top_k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_unstable_by(rank);

        trace!(candidates = self.len(), returned = k, "flat index search");

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                metadata: self.metadata[i].clone(),
                score,
            })
            .collect())
    }
}

/// Descending score, then ascending insertion position.
fn rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}
