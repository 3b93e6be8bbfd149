//! Concrete embedding backends for the core [`EmbeddingProvider`] port.
//!
//! | `embedding.provider` | Type | Notes |
//! |----------------------|------|-------|
//! | `disabled` | [`DisabledProvider`] | every call fails; `tsx chunk` still works |
//! | `openai` | [`OpenAIProvider`] | `OPENAI_API_KEY`; `url` may point at a compatible server |
//! | `ollama` | [`OllamaProvider`] | `{url}/api/embed`, default `http://localhost:11434` |
//! | `local` | `LocalProvider` | in-process fastembed, feature `local-embeddings-fastembed` |
//!
//! Texts are sent in `batch_size` slices. HTTP backends retry on 429, 5xx,
//! and connection errors with a doubling delay starting at one second
//! (at most 32s); other client errors fail at once.
//!
//! Whatever the backend returns is count- and dimension-checked, then
//! scaled to unit length, so index scores are always cosine similarities.
//!
//! ```rust
//! # use transcript_search::config::EmbeddingConfig;
//! # use transcript_search::embedding::create_provider;
//! let provider = create_provider(&EmbeddingConfig::default()).unwrap();
//! assert!(provider.embed(&["hello".to_string()]).is_err());
//! ```

use anyhow::{anyhow, bail, Result};
use std::time::Duration;
use tracing::{debug, warn};

pub use transcript_search_core::embedding::{l2_normalize, EmbeddingProvider};

use crate::config::EmbeddingConfig;

/// Placeholder for configs without an embedding backend.
pub struct DisabledProvider;

impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        bail!("Embedding provider is disabled. Set [embedding] provider in config.")
    }
}

/// Blocking JSON POST with retry and exponential backoff.
fn post_json_with_retry(
    client: &reqwest::blocking::Client,
    url: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
    max_retries: u32,
    label: &str,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            warn!(provider = label, attempt, ?delay, "retrying embedding request");
            std::thread::sleep(delay);
        }

        let mut request = client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        match request.send() {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json()?);
                }

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    let body_text = response.text().unwrap_or_default();
                    last_err = Some(anyhow!("{} API error {}: {}", label, status, body_text));
                    continue;
                }

                let body_text = response.text().unwrap_or_default();
                bail!("{} API error {}: {}", label, status, body_text);
            }
            Err(e) => {
                last_err = Some(anyhow!("{} connection error ({}): {}", label, url, e));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("{} embedding failed after retries", label)))
}

fn http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Enforce the provider contract on raw backend output.
fn finish(mut vectors: Vec<Vec<f32>>, expected: usize, dims: usize) -> Result<Vec<Vec<f32>>> {
    if vectors.len() != expected {
        bail!(
            "Embedding backend returned {} vectors for {} texts",
            vectors.len(),
            expected
        );
    }
    for v in vectors.iter_mut() {
        if v.len() != dims {
            bail!(
                "Embedding backend returned a {}-dim vector, expected {}",
                v.len(),
                dims
            );
        }
        l2_normalize(v);
    }
    Ok(vectors)
}

fn json_to_vec(value: &serde_json::Value) -> Option<Vec<f32>> {
    value
        .as_array()
        .map(|arr| arr.iter().map(|v| v.as_f64().unwrap_or(0.0) as f32).collect())
}

/// OpenAI (or OpenAI-compatible) `/v1/embeddings` client.
pub struct OpenAIProvider {
    model: String,
    dims: usize,
    endpoint: String,
    api_key: String,
    batch_size: usize,
    max_retries: u32,
    client: reqwest::blocking::Client,
}

impl OpenAIProvider {
    /// Fails when `model`/`dims` are missing or `OPENAI_API_KEY` is unset.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("embedding.model required for OpenAI provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow!("embedding.dims required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let base = config.url.as_deref().unwrap_or("https://api.openai.com");

        Ok(Self {
            model,
            dims,
            endpoint: embeddings_endpoint(base),
            api_key,
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
            client: http_client(config.timeout_secs)?,
        })
    }
}

/// Resolve the embeddings URL for an OpenAI-compatible base URL.
fn embeddings_endpoint(base_url: &str) -> String {
    let normalized = base_url.trim_end_matches('/');
    if normalized.ends_with("/embeddings") {
        return normalized.to_string();
    }
    if normalized.ends_with("/v1") {
        return format!("{}/embeddings", normalized);
    }
    format!("{}/v1/embeddings", normalized)
}

impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!(model = %self.model, batch = batch.len(), "openai embed batch");
            let body = serde_json::json!({
                "model": self.model,
                "input": batch,
            });
            let json = post_json_with_retry(
                &self.client,
                &self.endpoint,
                Some(&self.api_key),
                &body,
                self.max_retries,
                "OpenAI",
            )?;
            out.extend(finish(parse_openai_response(&json)?, batch.len(), self.dims)?);
        }
        Ok(out)
    }
}

/// `data[].embedding` arrays, ordered by each item's `index`.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());

    for (pos, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(json_to_vec)
            .ok_or_else(|| anyhow!("Invalid OpenAI response: missing embedding"))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(pos);
        indexed.push((index, embedding));
    }

    indexed.sort_by_key(|(i, _)| *i);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

/// Ollama `/api/embed` client. The model must already be pulled.
pub struct OllamaProvider {
    model: String,
    dims: usize,
    url: String,
    batch_size: usize,
    max_retries: u32,
    client: reqwest::blocking::Client,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("embedding.model required for Ollama provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow!("embedding.dims required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            model,
            dims,
            url: url.trim_end_matches('/').to_string(),
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
            client: http_client(config.timeout_secs)?,
        })
    }
}

impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let endpoint = format!("{}/api/embed", self.url);
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!(model = %self.model, batch = batch.len(), "ollama embed batch");
            let body = serde_json::json!({
                "model": self.model,
                "input": batch,
            });
            let json = post_json_with_retry(
                &self.client,
                &endpoint,
                None,
                &body,
                self.max_retries,
                "Ollama",
            )?;
            out.extend(finish(parse_ollama_response(&json)?, batch.len(), self.dims)?);
        }
        Ok(out)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing embeddings array"))?;

    embeddings
        .iter()
        .map(|e| {
            json_to_vec(e).ok_or_else(|| anyhow!("Invalid Ollama response: embedding is not an array"))
        })
        .collect()
}

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Models the local backend can load, with their output dimension.
/// The first entry is the default.
pub const LOCAL_MODELS: &[(&str, usize)] = &[
    ("all-minilm-l6-v2", 384),
    ("bge-small-en-v1.5", 384),
    ("bge-base-en-v1.5", 768),
    ("bge-large-en-v1.5", 1024),
    ("nomic-embed-text-v1.5", 768),
    ("multilingual-e5-small", 384),
];

/// Model name and dimension for the local provider.
///
/// Unknown names keep the configured `dims`; the model itself is
/// rejected when the provider is constructed.
pub fn resolve_local_model(config: &EmbeddingConfig) -> (String, usize) {
    let (default_name, default_dims) = LOCAL_MODELS[0];
    let name = config.model.as_deref().unwrap_or(default_name);
    let table_dims = LOCAL_MODELS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, d)| *d)
        .unwrap_or(default_dims);
    (name.to_string(), config.dims.unwrap_or(table_dims))
}

/// In-process embeddings via fastembed (ONNX). Weights are fetched from
/// Hugging Face once and cached.
#[cfg(feature = "local-embeddings-fastembed")]
pub struct LocalProvider {
    model_name: String,
    dims: usize,
    batch_size: usize,
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "local-embeddings-fastembed")]
impl LocalProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        use fastembed::EmbeddingModel as M;

        let (model_name, dims) = resolve_local_model(config);
        let which = match model_name.as_str() {
            "all-minilm-l6-v2" => M::AllMiniLML6V2,
            "bge-small-en-v1.5" => M::BGESmallENV15,
            "bge-base-en-v1.5" => M::BGEBaseENV15,
            "bge-large-en-v1.5" => M::BGELargeENV15,
            "nomic-embed-text-v1.5" => M::NomicEmbedTextV15,
            "multilingual-e5-small" => M::MultilingualE5Small,
            other => {
                let known: Vec<&str> = LOCAL_MODELS.iter().map(|(n, _)| *n).collect();
                bail!("Unknown local model '{}'; expected one of: {}", other, known.join(", "))
            }
        };
        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(which).with_show_download_progress(true),
        )
        .map_err(|e| anyhow!("Failed to load local model {}: {}", model_name, e))?;

        Ok(Self {
            model_name,
            dims,
            batch_size: config.batch_size.max(1),
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "local-embeddings-fastembed")]
impl EmbeddingProvider for LocalProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn dims(&self) -> usize {
        self.dims
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow!("Local embedding model lock poisoned"))?;
        let vectors = model
            .embed(texts.to_vec(), Some(self.batch_size))
            .map_err(|e| anyhow!("Local embedding failed: {}", e))?;
        finish(vectors, texts.len(), self.dims)
    }
}

/// Build the backend named by `embedding.provider`.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let provider: Box<dyn EmbeddingProvider> = match config.provider.as_str() {
        "disabled" => Box::new(DisabledProvider),
        "openai" => Box::new(OpenAIProvider::new(config)?),
        "ollama" => Box::new(OllamaProvider::new(config)?),
        #[cfg(feature = "local-embeddings-fastembed")]
        "local" => Box::new(LocalProvider::new(config)?),
        #[cfg(not(feature = "local-embeddings-fastembed"))]
        "local" => bail!(
            "Local embedding provider requires --features local-embeddings-fastembed"
        ),
        other => bail!("Unknown embedding provider: {}", other),
    };
    debug!(provider = %config.provider, model = provider.model_name(), "embedding provider ready");
    Ok(provider)
}
