use std::sync::Arc;

use tracing::{info, warn};

use crate::application::use_cases::{keywords, reasons};
use crate::application::{
    BookRepository, ChatClient, EmbeddingService, ReviewRepository, VectorStore,
};
use crate::domain::{Book, DomainError, Recommendation, RecommendedBook};

/// Neighbors fetched from the store before filtering.
const NEIGHBOR_FETCH: usize = 10;
/// Books kept after self-exclusion and dedup.
const MAX_RECOMMENDED: usize = 5;

/// Query-time engine: embed a review, find its nearest book vectors, and
/// derive keywords plus a one-sentence reason per candidate.
///
/// Only two failure modes surface as errors besides an unknown review id:
/// a review with no usable text (`InvalidInput`) and a failed embedding call
/// (`EmbeddingError`). Everything downstream degrades gracefully — no
/// neighbors means an empty book list, and reason synthesis always produces
/// at least the generic sentence.
pub struct RecommendBooksUseCase {
    reviews: Arc<dyn ReviewRepository>,
    books: Arc<dyn BookRepository>,
    embedding: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
    chat: Option<Arc<dyn ChatClient>>,
}

impl RecommendBooksUseCase {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        books: Arc<dyn BookRepository>,
        embedding: Arc<dyn EmbeddingService>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            reviews,
            books,
            embedding,
            store,
            chat: None,
        }
    }

    /// Enable the LLM layers (keyword extraction fallback and reason
    /// refinement).
    pub fn with_chat(mut self, chat: Arc<dyn ChatClient>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub async fn execute(&self, review_id: i64) -> Result<Recommendation, DomainError> {
        let review = self
            .reviews
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("review {review_id}")))?;
        let source_book = self
            .books
            .find_by_id(review.book_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("book {}", review.book_id)))?;

        let review_text = review.text();
        if review_text.is_empty() {
            return Err(DomainError::invalid_input("review has no usable text"));
        }

        let review_emb = self
            .embedding
            .embed(&review_text)
            .await
            .map_err(|e| DomainError::embedding(format!("review embedding failed: {e}")))?;

        let hits = match self.store.query(&review_emb, NEIGHBOR_FETCH).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("recommend: vector store query failed: {e}");
                Vec::new()
            }
        };

        // Never recommend the review's own book; dedup by ISBN keeping
        // nearest-first order.
        let mut isbns: Vec<String> = Vec::new();
        let mut documents: Vec<String> = Vec::new();
        for hit in &hits {
            let isbn = hit.metadata.isbn.trim().to_string();
            if isbn.is_empty() || isbn == source_book.isbn || isbns.contains(&isbn) {
                continue;
            }
            isbns.push(isbn);
            if isbns.len() >= MAX_RECOMMENDED {
                break;
            }
        }
        for hit in &hits {
            if !hit.document.is_empty() {
                documents.push(hit.document.clone());
            }
        }

        let candidates = self.resolve_books(&isbns).await?;

        let mut keyword_texts = vec![review_text.clone()];
        keyword_texts.extend(documents);
        let extracted = keywords::extract_keywords(
            self.chat.as_deref(),
            &keyword_texts,
            keywords::MAX_KEYWORDS,
        )
        .await;

        let mut reasoned: Vec<(Book, String)> = candidates
            .into_iter()
            .enumerate()
            .map(|(index, book)| {
                let reason = reasons::reason_for_book(&book, &source_book, &extracted, index);
                (book, reason)
            })
            .collect();

        if let Some(chat) = &self.chat {
            let refined =
                reasons::refine_reasons(chat.as_ref(), &reasoned, &extracted, &review_text).await;
            for ((_, reason), refined) in reasoned.iter_mut().zip(refined) {
                *reason = refined;
            }
        }

        info!(
            "recommend: review={review_id} neighbors={} books={} keywords={}",
            hits.len(),
            reasoned.len(),
            extracted.len()
        );

        Ok(Recommendation {
            review_id,
            keywords: extracted,
            books: reasoned
                .into_iter()
                .map(|(book, reason)| RecommendedBook { book, reason })
                .collect(),
        })
    }

    /// Resolve ISBNs to books, preserving the similarity-ranked order and
    /// dropping ISBNs the catalog no longer knows.
    async fn resolve_books(&self, isbns: &[String]) -> Result<Vec<Book>, DomainError> {
        let mut books = Vec::with_capacity(isbns.len());
        for isbn in isbns {
            if let Some(book) = self.books.find_by_isbn(isbn).await? {
                books.push(book);
            }
        }
        Ok(books)
    }
}
