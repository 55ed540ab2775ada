use async_trait::async_trait;

use crate::domain::{DomainError, VectorEntry, VectorHit};

/// Durable nearest-neighbor index, one named collection per embedding-model
/// family.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert-or-replace by entry id: any prior entry with the same id is
    /// deleted first, so repeated upserts never accumulate duplicates.
    async fn upsert(&self, entry: VectorEntry) -> Result<(), DomainError>;

    /// Up to `k` nearest entries by vector distance, closest first.
    /// Querying with a vector whose dimension differs from the collection's
    /// is a caller error.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>, DomainError>;
}
