use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;

use crate::application::EmbeddingService;
use crate::domain::DomainError;

/// Matches the production model's dimensionality.
const DEFAULT_DIMENSIONS: usize = 3072;

/// Deterministic stand-in for the remote embedding API: the same text always
/// maps to the same normalized vector. Used by tests and by `--mock-embeddings`
/// runs that exercise the pipelines without a credential.
pub struct MockEmbedding {
    dimensions: usize,
    model_key: String,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            model_key: "mock::embedding".to_string(),
        }
    }

    fn generate_embedding(&self, input: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        input.hash(&mut hasher);
        let seed = hasher.finish();

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }

        vector
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, DomainError> {
        if input.trim().is_empty() {
            return Err(DomainError::embedding("empty text"));
        }
        Ok(self.generate_embedding(input))
    }

    fn model_key(&self) -> &str {
        &self.model_key
    }
}
