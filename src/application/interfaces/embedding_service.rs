use async_trait::async_trait;

use crate::domain::DomainError;

/// Turns text into a fixed-length vector. Failures (missing credential,
/// transport error, malformed response) surface as `Err`; callers treat
/// them as "skip this unit of work", never as fatal.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Provider+model tag stamped on every persisted vector, e.g.
    /// `gms-openai::text-embedding-3-large`.
    fn model_key(&self) -> &str;
}
