//! Core data models used throughout Transcript Search.
//!
//! These types represent the timed transcript entries, chunks, and search
//! results that flow through the chunking and retrieval pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IndexError, Result};

/// Arbitrary string-keyed metadata stored alongside each indexed vector.
pub type Metadata = serde_json::Map<String, Value>;

/// A single time-coded line of transcript text, as produced by a
/// transcript source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEntry {
    pub text: String,
    /// Offset from the start of the recording, in seconds.
    pub start: f64,
    /// Length of the spoken segment, in seconds.
    pub duration: f64,
}

impl TimedEntry {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End of the entry: `start + duration`.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Reject blank text and negative or non-finite timings.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(IndexError::InvalidInput(
                "entry text must not be empty".to_string(),
            ));
        }
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(IndexError::InvalidInput(format!(
                "entry start must be a finite value >= 0, got {}",
                self.start
            )));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(IndexError::InvalidInput(format!(
                "entry duration must be a finite value >= 0, got {}",
                self.duration
            )));
        }
        Ok(())
    }
}

/// Validate every entry, reporting the position of the first bad one.
pub fn validate_entries(entries: &[TimedEntry]) -> Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        entry.validate().map_err(|e| match e {
            IndexError::InvalidInput(msg) => {
                IndexError::InvalidInput(format!("entry {}: {}", i, msg))
            }
            other => other,
        })?;
    }
    Ok(())
}

/// A contiguous, time-bounded merge of one or more transcript entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_index: usize,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl Chunk {
    /// Metadata record stored in the index for this chunk.
    pub fn to_metadata(&self) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert("chunk_index".to_string(), Value::from(self.chunk_index));
        meta.insert("text".to_string(), Value::from(self.text.clone()));
        meta.insert("start_time".to_string(), Value::from(self.start_time));
        meta.insert("end_time".to_string(), Value::from(self.end_time));
        meta
    }

    /// Rebuild a chunk from a metadata record written by [`Chunk::to_metadata`].
    ///
    /// Returns `None` when `text`, `start_time` or `end_time` is missing.
    /// A missing `chunk_index` defaults to 0.
    pub fn from_metadata(meta: &Metadata) -> Option<Self> {
        let text = meta.get("text")?.as_str()?.to_string();
        let start_time = meta.get("start_time")?.as_f64()?;
        let end_time = meta.get("end_time")?.as_f64()?;
        let chunk_index = meta
            .get("chunk_index")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        Some(Self {
            chunk_index,
            text,
            start_time,
            end_time,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A ranked match returned by the vector index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Copy of the matched entry's metadata.
    pub metadata: Metadata,
    /// Inner product of query and entry vectors (cosine similarity for unit vectors).
    pub score: f32,
}

impl SearchResult {
    /// The matched chunk, when the metadata carries chunk fields.
    pub fn chunk(&self) -> Option<Chunk> {
        Chunk::from_metadata(&self.metadata)
    }

    /// The `source` label attached at indexing time, if any.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }
}
