//! End-to-end library tests with a deterministic embedding provider.

use std::fs;

use anyhow::Result;
use tempfile::TempDir;

use transcript_search_core::store::VectorIndex;
use transcript_search::chunk::prepare_chunks;
use transcript_search::config::Config;
use transcript_search::embedding::{l2_normalize, EmbeddingProvider};
use transcript_search::ingest::build_index;
use transcript_search::search::search_with_provider;
use transcript_search::transcript::{JsonFileSource, TranscriptSource};

/// Bag-of-words over a tiny fixed vocabulary, normalized.
struct VocabProvider;

const VOCAB: &[&str] = &["rust", "memory", "python", "music", "cooking"];

impl EmbeddingProvider for VocabProvider {
    fn model_name(&self) -> &str {
        "vocab"
    }
    fn dims(&self) -> usize {
        VOCAB.len() + 1
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                let mut v: Vec<f32> = VOCAB
                    .iter()
                    .map(|w| lower.matches(w).count() as f32)
                    .collect();
                // Bias axis so texts with no vocabulary words are not zero.
                v.push(0.1);
                l2_normalize(&mut v);
                v
            })
            .collect())
    }
}

fn write_transcript(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("lecture.json");
    fs::write(
        &path,
        r#"[
  {"text": "Um welcome everyone", "start": 0, "duration": 4},
  {"text": "today we cover Rust and memory safety", "start": 4, "duration": 20},
  {"text": "  ", "start": 24, "duration": 1},
  {"text": "rust ownership keeps memory safe", "start": 30, "duration": 20},
  {"text": "switching topics to python", "start": 90, "duration": 30},
  {"text": "python is popular for scripting", "start": 120, "duration": 20},
  {"text": "finally some music and cooking tips", "start": 200, "duration": 30}
]"#,
    )
    .unwrap();
    path
}

#[test]
fn test_file_to_ranked_chunks() {
    let dir = TempDir::new().unwrap();
    let source = JsonFileSource::new(write_transcript(&dir));
    assert_eq!(source.name(), "lecture");

    let results =
        search_with_provider(&Config::minimal(), VocabProvider, &source, "rust memory", Some(2))
            .unwrap();

    assert_eq!(results.len(), 2);
    let top = results[0].chunk().unwrap();
    assert_eq!(top.start_time, 0.0);
    assert_eq!(top.end_time, 50.0);
    assert!(top.text.starts_with("welcome everyone"));
    assert_eq!(results[0].source(), Some("lecture"));
    assert!(results[0].score > results[1].score);
    assert!(results[0].score <= 1.0 + 1e-5);
}

#[test]
fn test_search_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let source = JsonFileSource::new(write_transcript(&dir));
    let cfg = Config::minimal();
    let a = search_with_provider(&cfg, VocabProvider, &source, "python", None).unwrap();
    let b = search_with_provider(&cfg, VocabProvider, &source, "python", None).unwrap();
    assert_eq!(a, b);
    assert_eq!(a[0].chunk().unwrap().start_time, 90.0);
}

#[test]
fn test_chunks_cover_all_entries_in_order() {
    let dir = TempDir::new().unwrap();
    let source = JsonFileSource::new(write_transcript(&dir));
    let mut cfg = Config::minimal();
    cfg.cleaning.enabled = false;
    let entries = source.fetch().unwrap();
    let n = entries.len();
    let chunks = prepare_chunks(entries.clone(), &cfg).unwrap();

    let joined: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let expected: Vec<String> = entries.iter().map(|e| e.text.clone()).collect();
    assert_eq!(joined.join(" "), expected.join(" "));
    assert_eq!(n, 6);
    for (i, c) in chunks.iter().enumerate() {
        assert_eq!(c.chunk_index, i);
    }
}

#[test]
fn test_index_holds_every_chunk() {
    let dir = TempDir::new().unwrap();
    let source = JsonFileSource::new(write_transcript(&dir));
    let chunks = prepare_chunks(source.fetch().unwrap(), &Config::minimal()).unwrap();
    let pipeline = build_index(VocabProvider, &chunks, Some(source.name()), 1).unwrap();
    assert_eq!(pipeline.index().len(), chunks.len());
    assert_eq!(pipeline.index().dims(), VOCAB.len() + 1);
}
