//! Time-bounded transcript chunker.
//!
//! Groups ordered [`TimedEntry`]s into contiguous [`Chunk`]s whose span
//! (from the first entry's start to the last entry's end) stays within
//! `max_duration` seconds.
//!
//! # Algorithm
//!
//! 1. Keep an open accumulator: pending texts, `chunk_start`, `chunk_end`.
//! 2. For each entry, compute `entry_end = start + duration`. If the
//!    accumulator is empty, `chunk_start = entry.start`.
//! 3. If `entry_end - chunk_start <= max_duration`, append the text and
//!    set `chunk_end = entry_end`.
//! 4. Otherwise flush the accumulator as a chunk and reseed it with the
//!    current entry.
//! 5. Flush whatever is left after the loop.
//!
//! The first entry of every accumulator is always accepted, so a single
//! entry longer than `max_duration` still forms its own chunk. Times are
//! rounded to two decimals only when a chunk is flushed; comparisons use
//! full precision.
//!
//! # Example
//!
//! ```rust
//! use transcript_search_core::chunk::chunk_transcript;
//! use transcript_search_core::models::TimedEntry;
//!
//! let entries = vec![
//!     TimedEntry::new("hello", 0.0, 2.0),
//!     TimedEntry::new("world", 2.0, 2.0),
//! ];
//! let chunks = chunk_transcript(&entries, 60.0);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].text, "hello world");
//! assert_eq!(chunks[0].end_time, 4.0);
//! ```

use crate::models::{Chunk, TimedEntry};

/// Default upper bound on a chunk's span, in seconds.
pub const DEFAULT_MAX_DURATION_SECS: f64 = 60.0;

/// Split ordered transcript entries into duration-bounded chunks.
///
/// Returns chunks with contiguous indices starting at 0. Input is assumed
/// to be ordered by `start` and is never re-sorted. Empty input yields no
/// chunks. A `max_duration` of zero or less puts every entry with a
/// non-zero span into its own chunk.
///
/// This function never fails; call
/// [`validate_entries`](crate::models::validate_entries) first to reject
/// malformed entries.
pub fn chunk_transcript(entries: &[TimedEntry], max_duration: f64) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    let mut chunk_start = 0.0;
    let mut chunk_end = 0.0;

    for entry in entries {
        let entry_end = entry.end();

        if pending.is_empty() {
            chunk_start = entry.start;
        }

        if pending.is_empty() || entry_end - chunk_start <= max_duration {
            pending.push(&entry.text);
            chunk_end = entry_end;
        } else {
            chunks.push(make_chunk(chunks.len(), &pending, chunk_start, chunk_end));
            pending.clear();
            pending.push(&entry.text);
            chunk_start = entry.start;
            chunk_end = entry_end;
        }
    }

    if !pending.is_empty() {
        chunks.push(make_chunk(chunks.len(), &pending, chunk_start, chunk_end));
    }

    chunks
}

fn make_chunk(index: usize, texts: &[&str], start: f64, end: f64) -> Chunk {
    Chunk {
        chunk_index: index,
        text: texts.join(" "),
        start_time: round2(start),
        end_time: round2(end),
    }
}

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
