//! Transcript sources.
//!
//! A [`TranscriptSource`] produces the ordered [`TimedEntry`] sequence the
//! chunker consumes. Failures here (missing file, malformed JSON) are
//! reported before the core pipeline runs and are never reinterpreted.
//!
//! | Source | Input |
//! |--------|-------|
//! | [`JsonFileSource`] | JSON array of `{ "text", "start", "duration" }` records |
//! | [`YouTubeSource`] | Captions of a YouTube video, by URL |
//!
//! [`open_source`] picks the source for a CLI argument: `http(s)://` inputs
//! are YouTube URLs, anything else is a file path.
//!
//! # YouTube captions
//!
//! 1. Read the watch page and pull out the InnerTube API key.
//! 2. Ask the InnerTube `player` endpoint for the caption track list.
//! 3. Pick a track: manually created captions in the first requested
//!    language that has one, else auto-generated captions the same way.
//! 4. Download the track as `json3` and turn its events into entries.
//!
//! Failures map onto [`TranscriptError`] so callers can tell a video with
//! captions turned off from one that does not exist.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::TranscriptConfig;
use crate::models::TimedEntry;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

static INNERTUBE_API_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("valid regex")
});

static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"v=([^&]+)", r"youtu\.be/([^?]+)", r"embed/([^?]+)"]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

/// Extract a YouTube video id from a watch, short, or embed URL.
///
/// Patterns are tried in order: `v=<id>`, `youtu.be/<id>`, `embed/<id>`.
///
/// ```rust
/// use transcript_search::transcript::extract_video_id;
///
/// assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42").unwrap(), "dQw4w9WgXcQ");
/// ```
pub fn extract_video_id(url: &str) -> Result<String> {
    for re in VIDEO_ID_PATTERNS.iter() {
        if let Some(id) = re.captures(url).and_then(|c| c.get(1)) {
            return Ok(id.as_str().to_string());
        }
    }
    bail!("Invalid YouTube URL: {}", url)
}

/// Anything that can produce an ordered transcript.
pub trait TranscriptSource {
    /// Label attached to indexed chunks (e.g. a video id or file name).
    fn name(&self) -> &str;

    /// Fetch all entries, ordered by start time.
    fn fetch(&self) -> Result<Vec<TimedEntry>>;
}

/// Raw record shape; `text` may be missing or blank in caption dumps.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    text: Option<String>,
    start: f64,
    duration: f64,
}

/// Reads a transcript saved as a JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<TimedEntry>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read transcript: {}", self.path.display()))?;
        parse_entries(&content)
            .with_context(|| format!("Failed to parse transcript: {}", self.path.display()))
    }
}

/// Parse a JSON transcript, trimming text and skipping blank entries.
pub fn parse_entries(json: &str) -> Result<Vec<TimedEntry>> {
    let raw: Vec<RawEntry> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .filter_map(|r| {
            let text = r.text?.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TimedEntry {
                text,
                start: r.start,
                duration: r.duration,
            })
        })
        .collect())
}

/// Pick a source for a CLI input: YouTube URL or transcript file.
pub fn open_source(input: &str, config: &TranscriptConfig) -> Result<Box<dyn TranscriptSource>> {
    if input.starts_with("http://") || input.starts_with("https://") {
        Ok(Box::new(YouTubeSource::from_url(input, config)?))
    } else {
        Ok(Box::new(JsonFileSource::new(input)))
    }
}

/// Why captions could not be obtained for a video.
#[derive(Debug, Error, PartialEq)]
pub enum TranscriptError {
    #[error("Transcripts are disabled for this video.")]
    Disabled,
    #[error("No transcript found for this video.")]
    NotFound,
    #[error("Video is unavailable or private.")]
    VideoUnavailable,
    #[error("Failed to fetch transcript: {0}")]
    Request(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    #[serde(default)]
    playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    #[serde(default)]
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

/// One caption track offered for a video.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated captions.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: f64,
    #[serde(default)]
    d_duration_ms: f64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Pull the InnerTube API key out of a watch page.
pub fn innertube_api_key(html: &str) -> Option<String> {
    INNERTUBE_API_KEY
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Caption tracks listed in an InnerTube `player` response.
pub fn caption_tracks(
    player_json: &str,
) -> std::result::Result<Vec<CaptionTrack>, TranscriptError> {
    let player: PlayerResponse = serde_json::from_str(player_json)
        .map_err(|e| TranscriptError::Request(format!("invalid player response: {}", e)))?;

    if let Some(status) = player.playability_status {
        if status.status != "OK" {
            debug!(status = %status.status, reason = ?status.reason, "video not playable");
            return Err(TranscriptError::VideoUnavailable);
        }
    }

    player
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .filter(|tracks| !tracks.is_empty())
        .ok_or(TranscriptError::Disabled)
}

/// Choose a track: manual captions first, then generated, each in
/// `languages` priority order.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> std::result::Result<&'a CaptionTrack, TranscriptError> {
    for generated in [false, true] {
        for lang in languages {
            if let Some(track) = tracks
                .iter()
                .find(|t| t.is_generated() == generated && &t.language_code == lang)
            {
                return Ok(track);
            }
        }
    }
    Err(TranscriptError::NotFound)
}

/// Parse a `json3` caption payload, trimming text and skipping blank events.
pub fn parse_json3(json: &str) -> std::result::Result<Vec<TimedEntry>, TranscriptError> {
    let payload: Json3 = serde_json::from_str(json)
        .map_err(|e| TranscriptError::Request(format!("invalid caption payload: {}", e)))?;

    Ok(payload
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ").trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TimedEntry {
                text,
                start: event.t_start_ms / 1000.0,
                duration: event.d_duration_ms / 1000.0,
            })
        })
        .collect())
}

/// Caption download URL for a track, forced to the `json3` format.
fn json3_url(base_url: &str) -> std::result::Result<reqwest::Url, TranscriptError> {
    let mut url = reqwest::Url::parse(base_url)
        .map_err(|e| TranscriptError::Request(format!("invalid caption url: {}", e)))?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");
    Ok(url)
}

/// Captions of one YouTube video.
pub struct YouTubeSource {
    video_id: String,
    languages: Vec<String>,
    client: reqwest::blocking::Client,
}

impl YouTubeSource {
    pub fn new(video_id: impl Into<String>, config: &TranscriptConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            video_id: video_id.into(),
            languages: config.languages.clone(),
            client,
        })
    }

    pub fn from_url(url: &str, config: &TranscriptConfig) -> Result<Self> {
        Self::new(extract_video_id(url)?, config)
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    fn get_text(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> std::result::Result<String, TranscriptError> {
        let response = request
            .header("Accept-Language", "en-US")
            .send()
            .map_err(|e| TranscriptError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranscriptError::Request(format!("HTTP {}", status)));
        }
        response
            .text()
            .map_err(|e| TranscriptError::Request(e.to_string()))
    }

    fn fetch_captions(&self) -> std::result::Result<Vec<TimedEntry>, TranscriptError> {
        let html = self.get_text(
            self.client
                .get(WATCH_URL)
                .query(&[("v", self.video_id.as_str())]),
        )?;
        let api_key = innertube_api_key(&html).ok_or_else(|| {
            TranscriptError::Request("InnerTube API key not found on watch page".to_string())
        })?;

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": self.video_id,
        });
        let player = self.get_text(
            self.client
                .post(PLAYER_URL)
                .query(&[("key", api_key.as_str())])
                .json(&body),
        )?;

        let tracks = caption_tracks(&player)?;
        let track = select_track(&tracks, &self.languages)?;
        debug!(
            video = %self.video_id,
            language = %track.language_code,
            generated = track.is_generated(),
            "selected caption track"
        );

        let payload = self.get_text(self.client.get(json3_url(&track.base_url)?))?;
        parse_json3(&payload)
    }
}

impl TranscriptSource for YouTubeSource {
    fn name(&self) -> &str {
        &self.video_id
    }

    fn fetch(&self) -> Result<Vec<TimedEntry>> {
        Ok(self.fetch_captions()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=abc123&t=10s").unwrap(),
            "abc123"
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(extract_video_id("https://youtu.be/xyz789").unwrap(), "xyz789");
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/e1e2e3?autoplay=1").unwrap(),
            "e1e2e3"
        );
    }

    #[test]
    fn test_invalid_url() {
        let err = extract_video_id("https://example.com/video").unwrap_err();
        assert!(err.to_string().contains("Invalid YouTube URL"));
    }

    #[test]
    fn test_parse_skips_blank_and_trims() {
        let json = r#"[
            {"text": "  first line ", "start": 0.0, "duration": 1.5},
            {"text": "   ", "start": 1.5, "duration": 1.0},
            {"start": 2.5, "duration": 1.0},
            {"text": "second", "start": 3.5, "duration": 2.0}
        ]"#;
        let entries = parse_entries(json).unwrap();
        assert_eq!(
            entries,
            vec![
                TimedEntry::new("first line", 0.0, 1.5),
                TimedEntry::new("second", 3.5, 2.0),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_missing_timing() {
        assert!(parse_entries(r#"[{"text": "x", "start": 0.0}]"#).is_err());
    }

    #[test]
    fn test_json_file_source() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"text": "hello", "start": 0, "duration": 2}}]"#).unwrap();
        let source = JsonFileSource::new(file.path());
        let entries = source.fetch().unwrap();
        assert_eq!(entries, vec![TimedEntry::new("hello", 0.0, 2.0)]);
        assert!(!source.name().is_empty());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let source = JsonFileSource::new("/no/such/transcript.json");
        let err = source.fetch().unwrap_err();
        assert!(format!("{:#}", err).contains("/no/such/transcript.json"));
        assert_eq!(source.name(), "transcript");
    }

    fn track(lang: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://www.youtube.com/api/timedtext?v=abc&lang={}", lang),
            language_code: lang.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_innertube_api_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSy-abc_123","X":1});</script>"#;
        assert_eq!(innertube_api_key(html).as_deref(), Some("AIzaSy-abc_123"));
        assert!(innertube_api_key("<html></html>").is_none());
    }

    #[test]
    fn test_caption_tracks_listed() {
        let player = r#"{
            "playabilityStatus": {"status": "OK"},
            "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                {"baseUrl": "https://x/timedtext?lang=en", "languageCode": "en", "kind": "asr"},
                {"baseUrl": "https://x/timedtext?lang=de", "languageCode": "de"}
            ]}}
        }"#;
        let tracks = caption_tracks(player).unwrap();
        assert_eq!(tracks.len(), 2);
        assert!(tracks[0].is_generated());
        assert!(!tracks[1].is_generated());
    }

    #[test]
    fn test_unplayable_video_is_unavailable() {
        let player = r#"{"playabilityStatus": {"status": "ERROR", "reason": "This video is unavailable"}}"#;
        let err = caption_tracks(player).unwrap_err();
        assert_eq!(err, TranscriptError::VideoUnavailable);
        assert_eq!(err.to_string(), "Video is unavailable or private.");

        let private = r#"{"playabilityStatus": {"status": "LOGIN_REQUIRED"}}"#;
        assert_eq!(caption_tracks(private).unwrap_err(), TranscriptError::VideoUnavailable);
    }

    #[test]
    fn test_missing_captions_means_disabled() {
        let err = caption_tracks(r#"{"playabilityStatus": {"status": "OK"}}"#).unwrap_err();
        assert_eq!(err, TranscriptError::Disabled);
        assert_eq!(err.to_string(), "Transcripts are disabled for this video.");

        let empty = r#"{"captions": {"playerCaptionsTracklistRenderer": {"captionTracks": []}}}"#;
        assert_eq!(caption_tracks(empty).unwrap_err(), TranscriptError::Disabled);
    }

    #[test]
    fn test_malformed_player_response() {
        assert!(matches!(
            caption_tracks("not json").unwrap_err(),
            TranscriptError::Request(_)
        ));
    }

    #[test]
    fn test_select_prefers_manual_track() {
        let tracks = vec![track("en", Some("asr")), track("en", None)];
        let chosen = select_track(&tracks, &langs(&["en"])).unwrap();
        assert!(!chosen.is_generated());
    }

    #[test]
    fn test_select_manual_in_any_language_beats_generated() {
        let tracks = vec![track("en", Some("asr")), track("de", None)];
        let chosen = select_track(&tracks, &langs(&["en", "de"])).unwrap();
        assert_eq!(chosen.language_code, "de");
        assert!(!chosen.is_generated());
    }

    #[test]
    fn test_select_falls_back_to_generated_in_priority_order() {
        let tracks = vec![track("fr", Some("asr")), track("de", Some("asr"))];
        let chosen = select_track(&tracks, &langs(&["de", "fr"])).unwrap();
        assert_eq!(chosen.language_code, "de");
    }

    #[test]
    fn test_select_no_matching_language() {
        let tracks = vec![track("ja", None)];
        let err = select_track(&tracks, &langs(&["en"])).unwrap_err();
        assert_eq!(err, TranscriptError::NotFound);
        assert_eq!(err.to_string(), "No transcript found for this video.");
    }

    #[test]
    fn test_parse_json3() {
        let payload = r#"{"events": [
            {"tStartMs": 0, "dDurationMs": 5000},
            {"tStartMs": 1200, "dDurationMs": 2500, "segs": [{"utf8": " hello"}, {"utf8": " world "}]},
            {"tStartMs": 3700, "dDurationMs": 1000, "segs": [{"utf8": "\n"}]},
            {"tStartMs": 4000, "dDurationMs": 1500, "segs": [{"utf8": "second\nline"}]}
        ]}"#;
        let entries = parse_json3(payload).unwrap();
        assert_eq!(
            entries,
            vec![
                TimedEntry::new("hello world", 1.2, 2.5),
                TimedEntry::new("second line", 4.0, 1.5),
            ]
        );
    }

    #[test]
    fn test_json3_url_replaces_format() {
        let url = json3_url("https://www.youtube.com/api/timedtext?v=abc&fmt=srv3&lang=en").unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("v=abc"));
        assert!(query.contains("lang=en"));
        assert!(query.ends_with("fmt=json3"));
        assert!(!query.contains("srv3"));
    }

    #[test]
    fn test_open_source_by_input_shape() {
        let cfg = TranscriptConfig::default();
        let file = open_source("./talk.json", &cfg).unwrap();
        assert_eq!(file.name(), "talk");
        let video = open_source("https://youtu.be/dQw4w9WgXcQ", &cfg).unwrap();
        assert_eq!(video.name(), "dQw4w9WgXcQ");
        assert!(open_source("https://example.com/clip", &cfg).is_err());
    }
}
