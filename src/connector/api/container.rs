use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::application::{
    BookVectorRepository, BuildBookVectorUseCase, ChatClient, EmbeddingService, PipelineQueue,
    RecommendBooksUseCase, ReviewSource, Summarizer, UpdateReviewVectorsUseCase,
    UserProfileRepository, VectorStore,
};
use crate::connector::adapter::{
    CachedEmbedding, EmbedCache, FileVectorStore, InMemoryBookRepository,
    InMemoryBookVectorRepository, InMemoryReviewRepository, InMemoryUserProfileRepository,
    MockEmbedding, OpenAiChatClient, OpenAiEmbedding, ReviewSummarizer, DEFAULT_COLLECTION,
};
use crate::connector::crawler::default_sources;
use crate::domain::{Book, Review};

pub struct ContainerConfig {
    pub data_dir: String,
    /// Use the deterministic mock instead of the remote embedding API —
    /// lets the pipelines run end-to-end without a credential.
    pub mock_embeddings: bool,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            mock_embeddings: false,
            workers: 2,
            queue_capacity: 64,
        }
    }
}

/// Wires every component once per process: clients constructed explicitly
/// from config + environment, stores rooted under the data directory, and
/// the catalog/review ports bound to the in-memory adapters a demo process
/// seeds from a file.
pub struct Container {
    books: Arc<InMemoryBookRepository>,
    reviews: Arc<InMemoryReviewRepository>,
    book_vectors: Arc<dyn BookVectorRepository>,
    profiles: Arc<dyn UserProfileRepository>,
    embedding: Arc<dyn EmbeddingService>,
    chat: Arc<dyn ChatClient>,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn VectorStore>,
    sources: Vec<Arc<dyn ReviewSource>>,
    config: ContainerConfig,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let data_dir = PathBuf::from(&config.data_dir);
        std::fs::create_dir_all(&data_dir)?;

        let embedding: Arc<dyn EmbeddingService> = if config.mock_embeddings {
            debug!("Using mock embedding service");
            Arc::new(MockEmbedding::new())
        } else {
            debug!("Using OpenAI-compatible embedding service with file cache");
            let cache = EmbedCache::open(data_dir.join("embed_cache.jsonl"))?;
            Arc::new(CachedEmbedding::new(OpenAiEmbedding::from_env(), cache))
        };

        let chat: Arc<dyn ChatClient> = Arc::new(OpenAiChatClient::from_env());
        let summarizer: Arc<dyn Summarizer> = Arc::new(ReviewSummarizer::new(chat.clone()));

        let store: Arc<dyn VectorStore> = Arc::new(FileVectorStore::open(
            data_dir.join("vectordb"),
            DEFAULT_COLLECTION,
        )?);

        Ok(Self {
            books: Arc::new(InMemoryBookRepository::new()),
            reviews: Arc::new(InMemoryReviewRepository::new()),
            book_vectors: Arc::new(InMemoryBookVectorRepository::new()),
            profiles: Arc::new(InMemoryUserProfileRepository::new()),
            embedding,
            chat,
            summarizer,
            store,
            sources: default_sources(),
            config,
        })
    }

    pub fn build_use_case(&self) -> BuildBookVectorUseCase {
        BuildBookVectorUseCase::new(
            self.books.clone(),
            self.book_vectors.clone(),
            self.sources.clone(),
            self.summarizer.clone(),
            self.embedding.clone(),
            self.store.clone(),
        )
    }

    pub fn update_use_case(&self) -> UpdateReviewVectorsUseCase {
        UpdateReviewVectorsUseCase::new(
            self.reviews.clone(),
            self.books.clone(),
            self.book_vectors.clone(),
            self.profiles.clone(),
            self.summarizer.clone(),
            self.embedding.clone(),
            self.store.clone(),
        )
    }

    pub fn recommend_use_case(&self) -> RecommendBooksUseCase {
        RecommendBooksUseCase::new(
            self.reviews.clone(),
            self.books.clone(),
            self.embedding.clone(),
            self.store.clone(),
        )
        .with_chat(self.chat.clone())
    }

    /// Spawn the background workers and hand back the submission handle.
    pub fn start_queue(&self) -> PipelineQueue {
        PipelineQueue::start(
            Arc::new(self.build_use_case()),
            Arc::new(self.update_use_case()),
            self.config.workers,
            self.config.queue_capacity,
        )
    }

    /// Load catalog/review fixtures into the in-memory ports.
    pub async fn seed(&self, books: Vec<Book>, reviews: Vec<Review>) {
        for book in books {
            self.books.insert(book).await;
        }
        for review in reviews {
            self.reviews.insert(review).await;
        }
    }

    pub fn data_dir(&self) -> &str {
        &self.config.data_dir
    }
}
