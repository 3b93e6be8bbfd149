//! Core data models used throughout the transcript search pipeline.
//!
//! The types live in `transcript-search-core` and are re-exported here so
//! CLI code and library users can reach them via `transcript_search::models`.

pub use transcript_search_core::models::*;
