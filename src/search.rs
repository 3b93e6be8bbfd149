//! Semantic search over a single transcript.
//!
//! [`search_transcript`] runs the whole pipeline for one query: load the
//! transcript, clean and chunk it, embed the chunks, build an in-memory
//! index, and rank chunks against the query. Nothing is persisted; every
//! invocation rebuilds the index.
//!
//! # Output
//!
//! `tsx search` prints one block per result:
//!
//! ```text
//! 1. [0.87] 00:01:02 - 00:02:00
//!     source: lecture-03
//!     excerpt: "ownership means every value has a single owner"
//! ```
//!
//! With `--json` the raw [`SearchResult`] list is printed instead.

use anyhow::{bail, Result};
use std::time::Instant;
use tracing::info;

use crate::chunk::prepare_chunks;
use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::ingest::{build_index, fetch_entries};
use crate::models::SearchResult;
use crate::transcript::{open_source, TranscriptSource};

/// Run the full pipeline against a transcript file or YouTube URL.
///
/// `top_k` falls back to `retrieval.top_k` from the config.
pub fn search_transcript(
    config: &Config,
    input: &str,
    query: &str,
    top_k: Option<usize>,
) -> Result<Vec<SearchResult>> {
    if !config.embedding.is_enabled() {
        bail!(
            "Search requires embeddings. Set [embedding] provider in config \
             (openai, ollama, or local)."
        );
    }
    let provider = create_provider(&config.embedding)?;
    let source = open_source(input, &config.transcript)?;
    search_with_provider(config, provider, source.as_ref(), query, top_k)
}

/// Same as [`search_transcript`] with an explicit provider and source.
pub fn search_with_provider<E: EmbeddingProvider>(
    config: &Config,
    provider: E,
    source: &dyn TranscriptSource,
    query: &str,
    top_k: Option<usize>,
) -> Result<Vec<SearchResult>> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let started = Instant::now();

    let entries = fetch_entries(source)?;
    let chunks = prepare_chunks(entries, config)?;
    let pipeline = build_index(
        provider,
        &chunks,
        Some(source.name()),
        config.embedding.batch_size,
    )?;
    let results = pipeline.query(query, top_k)?;

    info!(
        source = source.name(),
        chunks = chunks.len(),
        top_k,
        returned = results.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "search complete"
    );
    Ok(results)
}

/// Format a second offset as `HH:MM:SS`. Fractions are truncated;
/// negative or non-finite input is shown as zero.
pub fn format_timestamp(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as i64
    } else {
        0
    };
    match chrono::TimeDelta::try_seconds(total) {
        Some(d) => format!(
            "{:02}:{:02}:{:02}",
            d.num_hours(),
            d.num_minutes() % 60,
            d.num_seconds() % 60
        ),
        None => "--:--:--".to_string(),
    }
}

/// Run the `tsx search` command.
pub fn run_search(
    config: &Config,
    input: &str,
    query: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let results = search_transcript(config, input, query, top_k)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let Some(chunk) = result.chunk() else {
            continue;
        };
        println!(
            "{}. [{:.2}] {} - {}",
            i + 1,
            result.score,
            format_timestamp(chunk.start_time),
            format_timestamp(chunk.end_time)
        );
        if let Some(source) = result.source() {
            println!("    source: {}", source);
        }
        println!("    excerpt: \"{}\"", excerpt(&chunk.text, 200));
        println!();
    }

    Ok(())
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.replace('\n', " ");
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimedEntry;

    struct FixedSource(Vec<TimedEntry>);

    impl TranscriptSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }
        fn fetch(&self) -> Result<Vec<TimedEntry>> {
            Ok(self.0.clone())
        }
    }

    /// Scores texts by whether they mention "borrow".
    struct BorrowProvider;

    impl EmbeddingProvider for BorrowProvider {
        fn model_name(&self) -> &str {
            "borrow"
        }
        fn dims(&self) -> usize {
            2
        }
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("borrow") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
        assert_eq!(format_timestamp(62.9), "00:01:02");
        assert_eq!(format_timestamp(3725.0), "01:02:05");
        assert_eq!(format_timestamp(90_000.0), "25:00:00");
        assert_eq!(format_timestamp(-5.0), "00:00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00:00");
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_search_with_provider_ranks_matching_chunk_first() {
        let source = FixedSource(vec![
            TimedEntry::new("intro to the course", 0.0, 30.0),
            TimedEntry::new("the borrow checker", 100.0, 20.0),
            TimedEntry::new("closing remarks", 200.0, 10.0),
        ]);
        let results =
            search_with_provider(&Config::minimal(), BorrowProvider, &source, "borrow", Some(2))
                .unwrap();
        assert_eq!(results.len(), 2);
        let top = results[0].chunk().unwrap();
        assert_eq!(top.text, "the borrow checker");
        assert_eq!(top.start_time, 100.0);
        assert_eq!(results[0].source(), Some("fixed"));
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_search_uses_config_top_k() {
        let source = FixedSource(
            (0..10)
                .map(|i| TimedEntry::new(format!("segment {}", i), i as f64 * 100.0, 5.0))
                .collect(),
        );
        let mut cfg = Config::minimal();
        cfg.retrieval.top_k = 3;
        let results = search_with_provider(&cfg, BorrowProvider, &source, "q", None).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_search_transcript_requires_embeddings() {
        let err = search_transcript(
            &Config::minimal(),
            "/unused.json",
            "anything",
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("requires embeddings"));
    }
}
