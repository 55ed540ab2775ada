use serde::{Deserialize, Serialize};

/// Smoothing coefficient for the rolling user taste profile: recent signal
/// gets 20% weight, prior history keeps 80%.
pub const PROFILE_ALPHA: f32 = 0.2;

/// One embedding per book, replaced wholesale on every successful pipeline
/// run. `embedding_dim` is derived from the vector at construction so the
/// two can never drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookVectorRecord {
    pub book_id: i64,
    pub vector: Vec<f32>,
    pub embedding_model: String,
    pub embedding_dim: usize,
}

impl BookVectorRecord {
    pub fn new(book_id: i64, vector: Vec<f32>, embedding_model: impl Into<String>) -> Self {
        let embedding_dim = vector.len();
        Self {
            book_id,
            vector,
            embedding_model: embedding_model.into(),
            embedding_dim,
        }
    }
}

/// Rolling taste profile, one per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileRecord {
    pub user_id: i64,
    pub vector: Vec<f32>,
}

impl UserProfileRecord {
    pub fn new(user_id: i64, vector: Vec<f32>) -> Self {
        Self { user_id, vector }
    }
}

/// Exponential moving average over profile vectors:
/// `out[i] = (1 - alpha) * old[i] + alpha * new[i]`.
///
/// Callers must only blend vectors of equal dimension; a mismatch means the
/// embedding model changed and the profile is replaced outright instead.
pub fn blend_profile(old: &[f32], new: &[f32], alpha: f32) -> Vec<f32> {
    old.iter()
        .zip(new.iter())
        .map(|(o, n)| (1.0 - alpha) * o + alpha * n)
        .collect()
}

/// Entry stored in the vector index, keyed by ISBN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    /// Summary text returned verbatim from similarity queries.
    pub document: String,
    pub metadata: VectorMetadata,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub isbn: String,
    pub embedding_model: String,
}

/// One nearest-neighbor query result, smaller distance is closer.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: String,
    pub document: String,
    pub metadata: VectorMetadata,
    pub distance: f32,
}
