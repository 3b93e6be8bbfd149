//! Transcript text normalization.
//!
//! Auto-generated captions are noisy: filler tokens, irregular spacing,
//! stray spaces before punctuation. [`TextCleaner`] strips that noise from
//! each entry's text before chunking while leaving timings untouched.
//!
//! # Steps
//!
//! 1. Lowercase (optional).
//! 2. Remove configured filler words, whole-word, case-insensitive.
//! 3. Collapse runs of whitespace to a single space.
//! 4. Drop whitespace before `?`, `.`, `!`, `,`.
//! 5. Trim.
//!
//! Entries whose text is empty after cleaning are dropped.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CleaningConfig;
use crate::models::TimedEntry;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([?.!,])").expect("valid regex"));

/// Compiled cleaning rules.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    lowercase: bool,
    fillers: Option<Regex>,
}

impl TextCleaner {
    pub fn new(config: &CleaningConfig) -> Result<Self> {
        let words: Vec<String> = config
            .filler_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();

        let fillers = if words.is_empty() {
            None
        } else {
            let pattern = format!(r"(?i)\b(?:{})\b", words.join("|"));
            Some(
                Regex::new(&pattern)
                    .with_context(|| format!("Invalid filler word pattern: {}", pattern))?,
            )
        };

        Ok(Self {
            lowercase: config.lowercase,
            fillers,
        })
    }

    /// Clean a single line of transcript text.
    pub fn clean_text(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut out = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        if let Some(ref re) = self.fillers {
            out = re.replace_all(&out, "").into_owned();
        }

        let out = WHITESPACE_RUN.replace_all(&out, " ");
        let out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1");
        out.trim().to_string()
    }

    /// Clean every entry, keeping timings and dropping entries left empty.
    pub fn clean_transcript(&self, entries: Vec<TimedEntry>) -> Vec<TimedEntry> {
        entries
            .into_iter()
            .filter_map(|entry| {
                let text = self.clean_text(&entry.text);
                if text.is_empty() {
                    None
                } else {
                    Some(TimedEntry { text, ..entry })
                }
            })
            .collect()
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        // The default filler list is plain words, so compilation cannot fail.
        Self::new(&CleaningConfig::default()).unwrap_or(Self {
            lowercase: true,
            fillers: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_fillers_and_punctuation_spacing() {
        let cleaner = TextCleaner::default();
        assert_eq!(
            cleaner.clean_text("Uh this is, um, a test sentence!"),
            "this is,, a test sentence!"
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        let cleaner = TextCleaner::default();
        assert_eq!(
            cleaner.clean_text("   Lots     of    spaces here.  "),
            "lots of spaces here."
        );
    }

    #[test]
    fn test_filler_match_is_whole_word() {
        let cleaner = TextCleaner::default();
        assert_eq!(cleaner.clean_text("likely umbrella"), "likely umbrella");
        assert_eq!(cleaner.clean_text("I like it"), "i it");
    }

    #[test]
    fn test_lowercase_can_be_disabled() {
        let cfg = CleaningConfig {
            enabled: true,
            lowercase: false,
            filler_words: vec!["um".to_string()],
        };
        let cleaner = TextCleaner::new(&cfg).unwrap();
        assert_eq!(cleaner.clean_text("Um Rust Is Fun"), "Rust Is Fun");
    }

    #[test]
    fn test_empty_filler_list() {
        let cfg = CleaningConfig {
            enabled: true,
            lowercase: true,
            filler_words: Vec::new(),
        };
        let cleaner = TextCleaner::new(&cfg).unwrap();
        assert_eq!(cleaner.clean_text("um  ok"), "um ok");
    }

    #[test]
    fn test_filler_words_are_escaped() {
        let cfg = CleaningConfig {
            enabled: true,
            lowercase: true,
            filler_words: vec!["a.b".to_string()],
        };
        let cleaner = TextCleaner::new(&cfg).unwrap();
        assert_eq!(cleaner.clean_text("axb a.b"), "axb");
    }

    #[test]
    fn test_clean_transcript_drops_empty_and_keeps_timing() {
        let cleaner = TextCleaner::default();
        let entries = vec![
            TimedEntry::new("Um uh", 0.0, 1.0),
            TimedEntry::new("Hello   World", 1.0, 2.5),
        ];
        let cleaned = cleaner.clean_transcript(entries);
        assert_eq!(cleaned, vec![TimedEntry::new("hello world", 1.0, 2.5)]);
    }
}
