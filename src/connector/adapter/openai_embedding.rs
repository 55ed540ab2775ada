use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::application::EmbeddingService;
use crate::domain::{text, DomainError};

/// Default target: the GMS OpenAI gateway.
pub const DEFAULT_BASE_URL: &str = "https://gms.ssafy.io/gmsapi/api.openai.com";
const EMBEDDINGS_PATH: &str = "/v1/embeddings";
/// High-dimension (3072) OpenAI embedding model.
const DEFAULT_MODEL: &str = "text-embedding-3-large";
const PROVIDER: &str = "gms-openai";

/// Bulk calls through the gateway are slow; match its generous budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Per-chunk character cap keeping each request under the gateway's payload
/// limit.
const MAX_CHUNK_CHARS: usize = 2000;
/// Gateway-safe batch size.
const MAX_EMBED_BATCH: usize = 16;
/// Pause between consecutive batch requests.
const BATCH_PAUSE: Duration = Duration::from_millis(200);

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct ApiResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

/// HTTP client for an OpenAI-compatible embeddings endpoint.
///
/// Long input is split into fixed-size character chunks, embedded in batches,
/// and combined by element-wise mean into one vector for the whole text.
/// Every failure mode — missing key, transport error, non-2xx status,
/// malformed body — comes back as an `Err` the pipelines treat as "skip this
/// unit of work".
///
/// Configuration is injected at construction; `from_env` reads:
///
/// | Variable          | Default                                     |
/// |-------------------|---------------------------------------------|
/// | `GMS_KEY`         | `""` (every call fails until a key is set)  |
/// | `GMS_BASE_URL`    | the GMS OpenAI gateway                      |
/// | `GMS_EMBED_MODEL` | `text-embedding-3-large`                    |
pub struct OpenAiEmbedding {
    client: reqwest::Client,
    api_key: String,
    model: String,
    model_key: String,
    url: String,
}

impl OpenAiEmbedding {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base: String = base_url.into();
        let model: String = model.into();
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model_key: format!("{PROVIDER}::{model}"),
            url: format!("{}{EMBEDDINGS_PATH}", base.trim_end_matches('/')),
            model,
        }
    }

    pub fn from_env() -> Self {
        let key = std::env::var("GMS_KEY").unwrap_or_default();
        let base =
            std::env::var("GMS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model =
            std::env::var("GMS_EMBED_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(key, model, base)
    }

    async fn request_batch(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let request = ApiRequest {
            model: &self.model,
            input: chunks,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::embedding(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("OpenAiEmbedding: API returned {status}: {body}");
            return Err(DomainError::embedding(format!("API returned {status}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| DomainError::embedding(format!("failed to parse response: {e}")))?;

        if api_response.data.len() != chunks.len() {
            return Err(DomainError::embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                api_response.data.len()
            )));
        }

        Ok(api_response.data.into_iter().map(|i| i.embedding).collect())
    }
}

/// Split text into sequential chunks of at most `max_chars` characters.
pub(crate) fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return vec![text.to_string()];
    }
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Element-wise arithmetic mean. `None` for empty input or ragged
/// dimensions.
pub(crate) fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dim = first.len();
    if vectors.iter().any(|v| v.len() != dim) {
        return None;
    }

    let mut sum = vec![0.0f64; dim];
    for vector in vectors {
        for (acc, value) in sum.iter_mut().zip(vector.iter()) {
            *acc += f64::from(*value);
        }
    }
    let n = vectors.len() as f64;
    Some(sum.into_iter().map(|s| (s / n) as f32).collect())
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedding {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, DomainError> {
        if self.api_key.is_empty() {
            return Err(DomainError::embedding("missing API key"));
        }

        // Callers clean before embedding; re-clean defensively so an
        // oversized payload can never leave the process.
        let cleaned = text::clean(input);
        if cleaned.is_empty() {
            return Err(DomainError::embedding("empty text"));
        }

        let chunks = split_chunks(&cleaned, MAX_CHUNK_CHARS);
        let mut vectors = Vec::with_capacity(chunks.len());
        for (i, batch) in chunks.chunks(MAX_EMBED_BATCH).enumerate() {
            if i > 0 {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
            vectors.extend(self.request_batch(batch).await?);
        }

        mean_vector(&vectors)
            .ok_or_else(|| DomainError::embedding("no embeddings in response"))
    }

    fn model_key(&self) -> &str {
        &self.model_key
    }
}
