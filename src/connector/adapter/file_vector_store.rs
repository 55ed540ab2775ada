use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::VectorStore;
use crate::domain::{DomainError, VectorEntry, VectorHit};

/// Collection holding vectors of the production embedding model family.
pub const DEFAULT_COLLECTION: &str = "reviews_openai_large";

const SNAPSHOT_FILE: &str = "entries.json";

/// Durable nearest-neighbor index: one directory per named collection, all
/// entries held in memory and snapshotted to disk on every upsert via a
/// temp-file rename, so a torn write can never corrupt the collection.
///
/// Collections are per embedding-model family — an index built with one
/// model must never be queried with another model's vectors, and a
/// dimension mismatch is reported as a caller error rather than coerced.
pub struct FileVectorStore {
    snapshot_path: PathBuf,
    entries: Mutex<HashMap<String, VectorEntry>>,
}

impl FileVectorStore {
    /// Open (or create) the collection under `<root>/<collection>/`.
    pub fn open(root: impl AsRef<Path>, collection: &str) -> Result<Self, DomainError> {
        let dir = root.as_ref().join(collection);
        std::fs::create_dir_all(&dir)?;
        let snapshot_path = dir.join(SNAPSHOT_FILE);

        let entries: HashMap<String, VectorEntry> = if snapshot_path.exists() {
            let data = std::fs::read_to_string(&snapshot_path)?;
            serde_json::from_str::<Vec<VectorEntry>>(&data)
                .map_err(|e| DomainError::storage(format!("corrupt vector snapshot: {e}")))?
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect()
        } else {
            HashMap::new()
        };

        debug!(
            "vector store: collection {collection} loaded with {} entries",
            entries.len()
        );
        Ok(Self {
            snapshot_path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, VectorEntry>) -> Result<(), DomainError> {
        let snapshot: Vec<&VectorEntry> = entries.values().collect();
        let data = serde_json::to_string(&snapshot)
            .map_err(|e| DomainError::storage(format!("snapshot serialization: {e}")))?;

        let tmp_path = self.snapshot_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.snapshot_path)?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn upsert(&self, entry: VectorEntry) -> Result<(), DomainError> {
        if entry.id.trim().is_empty() {
            return Err(DomainError::invalid_input("vector entry id is empty"));
        }

        let mut entries = self.entries.lock().await;
        entries.remove(&entry.id);
        entries.insert(entry.id.clone(), entry);
        self.persist(&entries)
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>, DomainError> {
        let entries = self.entries.lock().await;

        if let Some(entry) = entries.values().next() {
            if entry.embedding.len() != embedding.len() {
                return Err(DomainError::invalid_input(format!(
                    "query dimension {} does not match collection dimension {}",
                    embedding.len(),
                    entry.embedding.len()
                )));
            }
        }

        let mut hits: Vec<VectorHit> = entries
            .values()
            .map(|entry| VectorHit {
                id: entry.id.clone(),
                document: entry.document.clone(),
                metadata: entry.metadata.clone(),
                distance: 1.0 - cosine_similarity(embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
