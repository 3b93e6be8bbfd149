//! # Transcript Search Core
//!
//! Shared, I/O-free logic for Transcript Search: data models, time-bounded
//! chunking, the embedding provider trait, the flat vector index, and the
//! query pipeline.
//!
//! This crate contains no network, filesystem, or async runtime
//! dependencies. Concrete embedding providers, transcript loading, and the
//! CLI live in the `transcript-search` app crate.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod search;
pub mod store;
