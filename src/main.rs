//! # Transcript Search CLI (`tsx`)
//!
//! ## Usage
//!
//! ```bash
//! tsx --config ./config/tsx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tsx chunk <file-or-url>` | Clean and chunk a transcript, print chunks as JSON |
//! | `tsx search <file-or-url> "<query>"` | Rank transcript chunks against a query |
//! | `tsx video-id <url>` | Print the video id contained in a YouTube URL |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `warn`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use transcript_search::{chunk, config, search, transcript};

/// Transcript Search CLI: semantic search over time-coded transcripts.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "tsx",
    about = "Transcript Search: chunk, embed, and query time-coded transcripts",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tsx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean and chunk a transcript file, printing chunks as JSON.
    Chunk {
        /// Transcript file (JSON array of `{ text, start, duration }`) or YouTube URL.
        input: String,

        /// Caption language, repeatable, in priority order (overrides config).
        #[arg(long = "lang")]
        languages: Vec<String>,

        /// Maximum chunk duration in seconds (overrides config).
        #[arg(long)]
        max_duration: Option<f64>,

        /// Skip text cleaning.
        #[arg(long)]
        no_clean: bool,
    },

    /// Search a transcript for the chunks most similar to a query.
    ///
    /// Requires an embedding provider in the `[embedding]` config section.
    Search {
        /// Transcript file (JSON array of `{ text, start, duration }`) or YouTube URL.
        input: String,

        /// Natural-language query.
        query: String,

        /// Number of results (overrides `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,

        /// Caption language, repeatable, in priority order (overrides config).
        #[arg(long = "lang")]
        languages: Vec<String>,
    },

    /// Extract the video id from a YouTube URL.
    VideoId {
        url: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::VideoId { url } = &cli.command {
        println!("{}", transcript::extract_video_id(url)?);
        return Ok(());
    }

    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Chunk {
            input,
            languages,
            max_duration,
            no_clean,
        } => {
            if !languages.is_empty() {
                cfg.transcript.languages = languages;
            }
            chunk::run_chunk(&cfg, &input, max_duration, no_clean)?;
        }
        Commands::Search {
            input,
            query,
            top_k,
            json,
            languages,
        } => {
            if !languages.is_empty() {
                cfg.transcript.languages = languages;
            }
            search::run_search(&cfg, &input, &query, top_k, json)?;
        }
        Commands::VideoId { .. } => {}
    }

    Ok(())
}
