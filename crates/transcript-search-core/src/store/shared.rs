//! Thread-shareable handle over a [`VectorIndex`].
//!
//! Wraps the index in `Arc<RwLock<_>>`: any number of concurrent
//! searches, at most one `add` at a time, and no search observes a
//! half-applied batch. Clones share the same underlying index.

use std::sync::{Arc, RwLock};

use crate::error::{IndexError, Result};
use crate::models::{Metadata, SearchResult};

use super::VectorIndex;

/// Single-writer, multi-reader handle to an index.
pub struct SharedIndex<I> {
    inner: Arc<RwLock<I>>,
}

impl<I> Clone for SharedIndex<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I: VectorIndex> SharedIndex<I> {
    pub fn new(index: I) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    pub fn dims(&self) -> Result<usize> {
        let guard = self.inner.read().map_err(|_| IndexError::LockPoisoned)?;
        Ok(guard.dims())
    }

    pub fn len(&self) -> Result<usize> {
        let guard = self.inner.read().map_err(|_| IndexError::LockPoisoned)?;
        Ok(guard.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Append a batch under the write lock.
    pub fn add(&self, vectors: Vec<Vec<f32>>, metadatas: Vec<Metadata>) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| IndexError::LockPoisoned)?;
        guard.add(vectors, metadatas)
    }

    /// Search under a read lock.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let guard = self.inner.read().map_err(|_| IndexError::LockPoisoned)?;
        guard.search(query, top_k)
    }
}
