//! Typed errors for the chunking, indexing, and query pipeline.
//!
//! Every precondition violation is surfaced to the immediate caller as an
//! [`IndexError`]. Nothing in the core catches and suppresses a failure, and
//! no failing operation leaves a partially-applied mutation behind.

use std::fmt;

use thiserror::Error;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Pipeline stage an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The embedding provider.
    Embed,
    /// The transcript source.
    Fetch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Embed => f.write_str("embed"),
            Stage::Fetch => f.write_str("fetch"),
        }
    }
}

/// Errors produced by the core.
#[derive(Debug, Error)]
pub enum IndexError {
    /// `add` was called with a different number of vectors and metadata records.
    #[error("length mismatch: {vectors} vectors but {metadatas} metadata records")]
    LengthMismatch { vectors: usize, metadatas: usize },

    /// A vector's length disagrees with the index dimension.
    #[error("dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Malformed input, e.g. a negative entry duration or `top_k == 0`.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A collaborator (embedding provider, transcript source) failed.
    ///
    /// The source error is carried verbatim; only the stage label is added.
    #[error("{stage} stage failed: {source}")]
    UpstreamFailure {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    /// A [`SharedIndex`](crate::store::shared::SharedIndex) lock was
    /// poisoned by a panicking holder.
    #[error("index lock poisoned")]
    LockPoisoned,
}

impl IndexError {
    /// Wrap a collaborator error with its stage label.
    pub fn upstream(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        IndexError::UpstreamFailure {
            stage,
            source: source.into(),
        }
    }
}
