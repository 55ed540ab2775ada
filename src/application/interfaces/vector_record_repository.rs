use async_trait::async_trait;

use crate::domain::{BookVectorRecord, DomainError, UserProfileRecord};

/// Relational persistence for per-book embeddings. `upsert` replaces the
/// whole row — vector, model tag, and dimension always change together.
#[async_trait]
pub trait BookVectorRepository: Send + Sync {
    async fn upsert(&self, record: BookVectorRecord) -> Result<(), DomainError>;

    async fn find_by_book(&self, book_id: i64) -> Result<Option<BookVectorRecord>, DomainError>;
}

/// Relational persistence for rolling user taste profiles.
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<UserProfileRecord>, DomainError>;

    async fn save(&self, record: UserProfileRecord) -> Result<(), DomainError>;
}
