//! Time-window transcript chunking.
//!
//! The chunking algorithm lives in `transcript-search-core`; this module
//! adds the CLI-facing step that runs cleaning and validation first and
//! the `tsx chunk` command.

use anyhow::Result;
use tracing::info;

pub use transcript_search_core::chunk::*;

use crate::clean::TextCleaner;
use crate::config::{validate, Config};
use crate::ingest::fetch_entries;
use crate::models::{validate_entries, Chunk, TimedEntry};
use crate::transcript::open_source;

/// Clean (when enabled), validate, and chunk a transcript.
pub fn prepare_chunks(entries: Vec<TimedEntry>, config: &Config) -> Result<Vec<Chunk>> {
    let entries = if config.cleaning.enabled {
        TextCleaner::new(&config.cleaning)?.clean_transcript(entries)
    } else {
        entries
    };
    validate_entries(&entries)?;
    Ok(chunk_transcript(
        &entries,
        config.chunking.max_duration_secs,
    ))
}

/// Run the `tsx chunk` command: print the chunks of a transcript file or
/// YouTube URL as JSON.
pub fn run_chunk(
    config: &Config,
    input: &str,
    max_duration: Option<f64>,
    no_clean: bool,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(max) = max_duration {
        config.chunking.max_duration_secs = max;
    }
    if no_clean {
        config.cleaning.enabled = false;
    }
    validate(&config)?;

    let source = open_source(input, &config.transcript)?;
    let entries = fetch_entries(source.as_ref())?;
    let chunks = prepare_chunks(entries, &config)?;
    info!(source = source.name(), chunks = chunks.len(), "chunked transcript");

    println!("{}", serde_json::to_string_pretty(&chunks)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<TimedEntry> {
        vec![
            TimedEntry::new("Um, welcome to the show", 0.0, 5.0),
            TimedEntry::new("today we talk about Rust", 5.0, 10.0),
            TimedEntry::new("uh", 15.0, 1.0),
            TimedEntry::new("ownership and borrowing", 70.0, 10.0),
        ]
    }

    #[test]
    fn test_prepare_chunks_cleans_then_chunks() {
        let chunks = prepare_chunks(fixture(), &Config::minimal()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, ", welcome to the show today we talk about rust");
        assert_eq!(chunks[0].end_time, 15.0);
        assert_eq!(chunks[1].text, "ownership and borrowing");
        assert_eq!(chunks[1].chunk_index, 1);
    }

    #[test]
    fn test_prepare_chunks_without_cleaning() {
        let mut cfg = Config::minimal();
        cfg.cleaning.enabled = false;
        let chunks = prepare_chunks(fixture(), &cfg).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Um, welcome to the show today we talk about Rust uh");
        assert_eq!(chunks[0].end_time, 16.0);
    }

    #[test]
    fn test_prepare_chunks_rejects_negative_duration() {
        let entries = vec![TimedEntry::new("bad", 0.0, -1.0)];
        assert!(prepare_chunks(entries, &Config::minimal()).is_err());
    }

    #[test]
    fn test_run_chunk_rejects_non_finite_override() {
        let err = run_chunk(
            &Config::minimal(),
            "/never/read.json",
            Some(f64::NAN),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_duration_secs"), "{}", err);
    }

    #[test]
    fn test_prepare_chunks_respects_max_duration() {
        let mut cfg = Config::minimal();
        cfg.cleaning.enabled = false;
        cfg.chunking.max_duration_secs = 10.0;
        let chunks = prepare_chunks(fixture(), &cfg).unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.duration() <= 10.0));
    }
}
