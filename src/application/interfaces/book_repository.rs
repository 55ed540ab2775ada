use async_trait::async_trait;

use crate::domain::{Book, DomainError, Review};

/// Read access to the external book catalog.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, DomainError>;

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, DomainError>;
}

/// Read access to the external review store.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Review>, DomainError>;

    async fn list_by_book(&self, book_id: i64) -> Result<Vec<Review>, DomainError>;
}
