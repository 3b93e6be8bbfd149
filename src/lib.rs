//! # Transcript Search
//!
//! Semantic search over time-coded transcripts.
//!
//! Transcripts are cleaned, merged into time-bounded chunks, embedded, and
//! loaded into an exact in-memory vector index; queries return the most
//! similar chunks together with their time ranges so a reader can jump to
//! the right moment of the recording.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ Transcript  │──▶│ Clean+Chunk  │──▶│   Embed     │
//! │  (JSON)     │   │ (time window)│   │ (provider)  │
//! └─────────────┘   └──────────────┘   └──────┬──────┘
//!                                             ▼
//!                   ┌──────────────┐   ┌─────────────┐
//!                   │ Ranked chunks│◀──│  FlatIndex  │
//!                   │  (CLI/JSON)  │   │ (in-memory) │
//!                   └──────────────┘   └─────────────┘
//! ```
//!
//! The chunker, index, and query pipeline live in `transcript-search-core`
//! and have no I/O. This crate adds configuration, transcript sources,
//! text cleaning, HTTP/local embedding providers, and the `tsx` CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! tsx video-id "https://youtu.be/dQw4w9WgXcQ"
//! tsx chunk ./talk.json --max-duration 45
//! tsx search ./talk.json "how does the borrow checker work" --top-k 3
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`transcript`] | Transcript sources and video id parsing |
//! | [`clean`] | Caption text normalization |
//! | [`chunk`] | Time-window chunking |
//! | [`embedding`] | Embedding provider implementations |
//! | [`ingest`] | Source-to-index orchestration |
//! | [`search`] | Query execution and result formatting |

pub mod chunk;
pub mod clean;
pub mod config;
pub mod embedding;
pub mod ingest;
pub mod models;
pub mod search;
pub mod transcript;
