//! HashMap-backed adapters for the external collaborator ports and an
//! in-memory vector store. Used for tests and for demo runs where the
//! relational store is seeded from a file instead of a database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::{
    BookRepository, BookVectorRepository, ReviewRepository, UserProfileRepository, VectorStore,
};
use crate::connector::adapter::file_vector_store::cosine_similarity;
use crate::domain::{
    Book, BookVectorRecord, DomainError, Review, UserProfileRecord, VectorEntry, VectorHit,
};

#[derive(Default)]
pub struct InMemoryBookRepository {
    books: Mutex<HashMap<i64, Book>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, book: Book) {
        self.books.lock().await.insert(book.id, book);
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, DomainError> {
        Ok(self.books.lock().await.get(&id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, DomainError> {
        Ok(self
            .books
            .lock()
            .await
            .values()
            .find(|b| b.isbn == isbn)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryReviewRepository {
    reviews: Mutex<HashMap<i64, Review>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, review: Review) {
        self.reviews.lock().await.insert(review.id, review);
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Review>, DomainError> {
        Ok(self.reviews.lock().await.get(&id).cloned())
    }

    async fn list_by_book(&self, book_id: i64) -> Result<Vec<Review>, DomainError> {
        let mut reviews: Vec<Review> = self
            .reviews
            .lock()
            .await
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }
}

#[derive(Default)]
pub struct InMemoryBookVectorRepository {
    records: Mutex<HashMap<i64, BookVectorRecord>>,
}

impl InMemoryBookVectorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookVectorRepository for InMemoryBookVectorRepository {
    async fn upsert(&self, record: BookVectorRecord) -> Result<(), DomainError> {
        self.records.lock().await.insert(record.book_id, record);
        Ok(())
    }

    async fn find_by_book(&self, book_id: i64) -> Result<Option<BookVectorRecord>, DomainError> {
        Ok(self.records.lock().await.get(&book_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryUserProfileRepository {
    records: Mutex<HashMap<i64, UserProfileRecord>>,
}

impl InMemoryUserProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserProfileRepository for InMemoryUserProfileRepository {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<UserProfileRecord>, DomainError> {
        Ok(self.records.lock().await.get(&user_id).cloned())
    }

    async fn save(&self, record: UserProfileRecord) -> Result<(), DomainError> {
        self.records.lock().await.insert(record.user_id, record);
        Ok(())
    }
}

/// Non-persistent [`VectorStore`] with the same upsert/query semantics as
/// the file-backed one.
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: Mutex<HashMap<String, VectorEntry>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, entry: VectorEntry) -> Result<(), DomainError> {
        if entry.id.trim().is_empty() {
            return Err(DomainError::invalid_input("vector entry id is empty"));
        }
        let mut entries = self.entries.lock().await;
        entries.remove(&entry.id);
        entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>, DomainError> {
        let entries = self.entries.lock().await;

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
