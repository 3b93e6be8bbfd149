//! Vector index abstraction for Transcript Search.
//!
//! The [`VectorIndex`] trait defines the similarity-search operations the
//! query pipeline needs, so the flat exact index can be swapped for another
//! backend without touching chunking or query logic.
//!
//! | Backend | Module |
//! |---------|--------|
//! | Flat exact inner-product scan | [`memory`] |
//! | Single-writer / multi-reader wrapper | [`shared`] |

pub mod memory;
pub mod shared;

use crate::error::Result;
use crate::models::{Metadata, SearchResult};

/// A fixed-dimension vector index with an aligned metadata side-table.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`dims`](VectorIndex::dims) | Dimension fixed at construction |
/// | [`len`](VectorIndex::len) | Number of stored entries |
/// | [`add`](VectorIndex::add) | Append a batch of vectors with metadata, all-or-nothing |
/// | [`search`](VectorIndex::search) | Top-k entries by descending inner product |
///
/// Implementations must keep vector storage and metadata the same length,
/// with position `i` in one matching position `i` in the other.
pub trait VectorIndex: Send + Sync {
    /// Dimension every stored and query vector must have.
    fn dims(&self) -> usize;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `vectors[i]` paired with `metadatas[i]` for every `i`.
    ///
    /// Either every entry is appended or, on error, none are.
    fn add(&mut self, vectors: Vec<Vec<f32>>, metadatas: Vec<Metadata>) -> Result<()>;

    /// Return up to `top_k` entries ordered by descending score, ties broken
    /// by insertion order.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;
}
