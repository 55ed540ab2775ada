use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::EmbeddingService;
use crate::domain::{text, DomainError};

/// One line of the append-only cache log.
#[derive(Serialize, Deserialize)]
struct CacheRecord {
    provider_model: String,
    text_hash: String,
    vec: Vec<f32>,
}

/// Content-addressed embedding cache: append-only JSONL keyed by
/// `(provider_model, hash(text))`. Entries are immutable once written — the
/// same text under the same model always maps to the same vector, so
/// concurrent writers for one key race harmlessly.
pub struct EmbedCache {
    path: PathBuf,
    entries: Mutex<HashMap<(String, String), Vec<f32>>>,
}

impl EmbedCache {
    /// Load an existing log (malformed lines are skipped) or start empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let mut entries = HashMap::new();

        if path.exists() {
            let file = File::open(&path)?;
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<CacheRecord>(&line) {
                    Ok(record) => {
                        entries.insert((record.provider_model, record.text_hash), record.vec);
                    }
                    Err(e) => warn!("embed cache: skipping malformed line: {e}"),
                }
            }
        } else if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        debug!("embed cache: {} entries loaded from {:?}", entries.len(), path);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn get(&self, provider_model: &str, text_hash: &str) -> Option<Vec<f32>> {
        self.entries
            .lock()
            .ok()?
            .get(&(provider_model.to_string(), text_hash.to_string()))
            .cloned()
    }

    /// Insert and append one log record. The key hashes the *whole* text the
    /// caller embedded, not its chunks.
    pub fn insert(
        &self,
        provider_model: &str,
        input: &str,
        vec: Vec<f32>,
    ) -> Result<(), DomainError> {
        let record = CacheRecord {
            provider_model: provider_model.to_string(),
            text_hash: text::stable_hash(input),
            vec,
        };

        let line = serde_json::to_string(&record)
            .map_err(|e| DomainError::storage(format!("cache record serialization: {e}")))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;

        if let Ok(mut entries) = self.entries.lock() {
            entries.insert((record.provider_model, record.text_hash), record.vec);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Caching decorator over any [`EmbeddingService`]: a hit answers with zero
/// calls to the inner service, a miss embeds once and appends to the log.
pub struct CachedEmbedding<S> {
    inner: S,
    cache: EmbedCache,
}

impl<S: EmbeddingService> CachedEmbedding<S> {
    pub fn new(inner: S, cache: EmbedCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<S: EmbeddingService> EmbeddingService for CachedEmbedding<S> {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, DomainError> {
        let cleaned = text::clean(input);
        let hash = text::stable_hash(&cleaned);

        if let Some(vector) = self.cache.get(self.inner.model_key(), &hash) {
            debug!("embed cache hit for {hash}");
            return Ok(vector);
        }

        let vector = self.inner.embed(&cleaned).await?;
        if let Err(e) = self.cache.insert(self.inner.model_key(), &cleaned, vector.clone()) {
            // A failed append only costs a future network call.
            warn!("embed cache: append failed: {e}");
        }
        Ok(vector)
    }

    fn model_key(&self) -> &str {
        self.inner.model_key()
    }
}
