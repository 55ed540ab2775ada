use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::application::{
    BookRepository, BookVectorRepository, EmbeddingService, ReviewSource, Summarizer, VectorStore,
};
use crate::domain::{
    text, Book, BookVectorRecord, DomainError, VectorEntry, VectorMetadata,
};

/// How often and how long to re-try the book lookup. The trigger fires right
/// after the external store's insert, which may not be visible yet.
const LOOKUP_ATTEMPTS: usize = 3;
const LOOKUP_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Why a pipeline run stopped. Early terminations are normal outcomes, not
/// errors; only persistence failures surface as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Completed,
    SkippedNoIsbn,
    SkippedBookNotFound,
    SkippedNoContent,
    SkippedEmbeddingFailed,
}

/// Crawl → summarize → embed → persist pipeline for one book, keyed by ISBN.
/// Stateless across invocations beyond the persisted vector; re-running for
/// the same ISBN converges to a single store entry.
pub struct BuildBookVectorUseCase {
    books: Arc<dyn BookRepository>,
    book_vectors: Arc<dyn BookVectorRepository>,
    sources: Vec<Arc<dyn ReviewSource>>,
    summarizer: Arc<dyn Summarizer>,
    embedding: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
}

impl BuildBookVectorUseCase {
    pub fn new(
        books: Arc<dyn BookRepository>,
        book_vectors: Arc<dyn BookVectorRepository>,
        sources: Vec<Arc<dyn ReviewSource>>,
        summarizer: Arc<dyn Summarizer>,
        embedding: Arc<dyn EmbeddingService>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            books,
            book_vectors,
            sources,
            summarizer,
            embedding,
            store,
        }
    }

    pub async fn execute(&self, isbn: &str) -> Result<BuildOutcome, DomainError> {
        let isbn = isbn.trim();
        if isbn.is_empty() {
            return Ok(BuildOutcome::SkippedNoIsbn);
        }

        let book = match self.resolve_book(isbn).await? {
            Some(book) => book,
            None => {
                info!("build: book with ISBN {isbn} not found, skipping");
                return Ok(BuildOutcome::SkippedBookNotFound);
            }
        };

        let bundles = self.crawl_all(isbn).await;

        let mut summaries = Vec::new();
        for (source_type, texts) in &bundles {
            if texts.is_empty() {
                continue;
            }
            let summary = self.summarizer.summarize(*source_type, texts).await;
            if !summary.summary.is_empty() {
                summaries.push(summary.summary);
            }
        }

        let combined = text::clean(&summaries.join(" "));
        if combined.is_empty() {
            info!("build: no usable review content for ISBN {isbn}, no vector written");
            return Ok(BuildOutcome::SkippedNoContent);
        }

        let embedding = match self.embedding.embed(&combined).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("build: embedding failed for ISBN {isbn}: {e}");
                return Ok(BuildOutcome::SkippedEmbeddingFailed);
            }
        };

        persist_book_vector(
            self.book_vectors.as_ref(),
            self.store.as_ref(),
            &book,
            &combined,
            embedding,
            self.embedding.model_key(),
        )
        .await?;

        info!("build: vector persisted for ISBN {isbn}");
        Ok(BuildOutcome::Completed)
    }

    async fn resolve_book(&self, isbn: &str) -> Result<Option<Book>, DomainError> {
        for attempt in 1..=LOOKUP_ATTEMPTS {
            if let Some(book) = self.books.find_by_isbn(isbn).await? {
                return Ok(Some(book));
            }
            if attempt < LOOKUP_ATTEMPTS {
                tokio::time::sleep(LOOKUP_RETRY_DELAY).await;
            }
        }
        Ok(None)
    }

    /// Run every configured source against the ISBN. Sources are isolated:
    /// each resolves and fetches on its own, and an empty or failed source
    /// contributes an empty bundle without affecting the rest.
    async fn crawl_all(&self, isbn: &str) -> Vec<(crate::domain::SourceType, Vec<String>)> {
        let fetches = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            let isbn = isbn.to_string();
            async move {
                let texts = match source.resolve_external_id(&isbn).await {
                    Some(id) => source
                        .fetch_reviews(&id, &isbn)
                        .await
                        .into_iter()
                        .map(|r| r.review_text)
                        .collect(),
                    None => Vec::new(),
                };
                info!(
                    "crawl: source={} isbn={} reviews={}",
                    source.name(),
                    isbn,
                    texts.len()
                );
                (source.source_type(), texts)
            }
        });
        join_all(fetches).await
    }
}

/// Final persist step shared by the build and review-update pipelines:
/// replace the relational row, then delete-and-add the store entry keyed by
/// ISBN. Both writes are idempotent per book, so racing runs resolve to
/// last-writer-wins.
pub(crate) async fn persist_book_vector(
    book_vectors: &dyn BookVectorRepository,
    store: &dyn VectorStore,
    book: &Book,
    summary: &str,
    embedding: Vec<f32>,
    model_key: &str,
) -> Result<(), DomainError> {
    book_vectors
        .upsert(BookVectorRecord::new(book.id, embedding.clone(), model_key))
        .await?;

    store
        .upsert(VectorEntry {
            id: book.isbn.clone(),
            document: summary.to_string(),
            metadata: VectorMetadata {
                isbn: book.isbn.clone(),
                embedding_model: model_key.to_string(),
            },
            embedding,
        })
        .await
}
