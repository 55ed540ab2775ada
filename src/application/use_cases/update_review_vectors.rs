use std::sync::Arc;

use tracing::{info, warn};

use crate::application::use_cases::build_book_vector::persist_book_vector;
use crate::application::{
    BookRepository, BookVectorRepository, EmbeddingService, ReviewRepository, Summarizer,
    UserProfileRepository, VectorStore,
};
use crate::domain::models::{blend_profile, PROFILE_ALPHA};
use crate::domain::{text, DomainError, SourceType, UserProfileRecord};

/// What a single run actually changed. Review-not-found comes back as the
/// all-false report — a normal early termination, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub profile_updated: bool,
    pub book_vector_updated: bool,
}

/// Per-review pipeline: roll the reviewer's taste profile forward, then
/// recompute the book's vector from the full current review set. The two
/// halves are independent — a failure in one never blocks the other.
pub struct UpdateReviewVectorsUseCase {
    reviews: Arc<dyn ReviewRepository>,
    books: Arc<dyn BookRepository>,
    book_vectors: Arc<dyn BookVectorRepository>,
    profiles: Arc<dyn UserProfileRepository>,
    summarizer: Arc<dyn Summarizer>,
    embedding: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
}

impl UpdateReviewVectorsUseCase {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        books: Arc<dyn BookRepository>,
        book_vectors: Arc<dyn BookVectorRepository>,
        profiles: Arc<dyn UserProfileRepository>,
        summarizer: Arc<dyn Summarizer>,
        embedding: Arc<dyn EmbeddingService>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            reviews,
            books,
            book_vectors,
            profiles,
            summarizer,
            embedding,
            store,
        }
    }

    pub async fn execute(&self, review_id: i64) -> Result<UpdateReport, DomainError> {
        let review = match self.reviews.find_by_id(review_id).await? {
            Some(review) => review,
            None => {
                info!("update: review {review_id} not found, skipping");
                return Ok(UpdateReport::default());
            }
        };

        let mut report = UpdateReport::default();

        let review_text = review.text();
        if !review_text.is_empty() {
            match self.update_user_profile(review.user_id, &review_text).await {
                Ok(updated) => report.profile_updated = updated,
                Err(e) => warn!("update: profile update failed for user {}: {e}", review.user_id),
            }
        }

        match self.recompute_book_vector(review.book_id).await {
            Ok(updated) => report.book_vector_updated = updated,
            Err(e) => warn!("update: book vector recompute failed for book {}: {e}", review.book_id),
        }

        Ok(report)
    }

    /// First review creates the profile as-is; later reviews blend with the
    /// EMA. A dimension mismatch means a stale model — replace outright.
    async fn update_user_profile(
        &self,
        user_id: i64,
        review_text: &str,
    ) -> Result<bool, DomainError> {
        let review_emb = match self.embedding.embed(review_text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("update: review embedding failed for user {user_id}: {e}");
                return Ok(false);
            }
        };

        let vector = match self.profiles.find_by_user(user_id).await? {
            Some(profile) if profile.vector.len() == review_emb.len() => {
                blend_profile(&profile.vector, &review_emb, PROFILE_ALPHA)
            }
            _ => review_emb,
        };

        self.profiles.save(UserProfileRecord::new(user_id, vector)).await?;
        Ok(true)
    }

    /// Summarize every review the book currently has as one user-review
    /// bundle and persist exactly like the build pipeline's final step.
    async fn recompute_book_vector(&self, book_id: i64) -> Result<bool, DomainError> {
        let book = match self.books.find_by_id(book_id).await? {
            Some(book) => book,
            None => return Ok(false),
        };
        if !book.has_isbn() {
            // The store is keyed by ISBN; ISBN-less books stay out of the
            // pipeline entirely.
            return Ok(false);
        }

        let review_texts: Vec<String> = self
            .reviews
            .list_by_book(book_id)
            .await?
            .iter()
            .map(|r| r.text())
            .filter(|t| !t.is_empty())
            .collect();
        if review_texts.is_empty() {
            return Ok(false);
        }

        let summary = self
            .summarizer
            .summarize(SourceType::UserReview, &review_texts)
            .await;
        let summary_text = text::clean(&summary.summary);
        if summary_text.is_empty() {
            return Ok(false);
        }

        let embedding = match self.embedding.embed(&summary_text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("update: summary embedding failed for book {book_id}: {e}");
                return Ok(false);
            }
        };

        persist_book_vector(
            self.book_vectors.as_ref(),
            self.store.as_ref(),
            &book,
            &summary_text,
            embedding,
            self.embedding.model_key(),
        )
        .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::application::Summarizer;
    use crate::connector::adapter::{
        InMemoryBookRepository, InMemoryBookVectorRepository, InMemoryReviewRepository,
        InMemoryUserProfileRepository, InMemoryVectorStore, MockEmbedding,
    };
    use crate::domain::{Book, Review, SourceSummary};

    struct EchoSummarizer;

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, _source: SourceType, texts: &[String]) -> SourceSummary {
            SourceSummary {
                summary: texts.join(" "),
                ..SourceSummary::default()
            }
        }
    }

    struct Env {
        books: Arc<InMemoryBookRepository>,
        reviews: Arc<InMemoryReviewRepository>,
        book_vectors: Arc<InMemoryBookVectorRepository>,
        profiles: Arc<InMemoryUserProfileRepository>,
        store: Arc<InMemoryVectorStore>,
        embedding: Arc<MockEmbedding>,
    }

    impl Env {
        async fn new() -> Self {
            let env = Self {
                books: Arc::new(InMemoryBookRepository::new()),
                reviews: Arc::new(InMemoryReviewRepository::new()),
                book_vectors: Arc::new(InMemoryBookVectorRepository::new()),
                profiles: Arc::new(InMemoryUserProfileRepository::new()),
                store: Arc::new(InMemoryVectorStore::new()),
                embedding: Arc::new(MockEmbedding::with_dimensions(8)),
            };
            env.books
                .insert(Book {
                    id: 2,
                    isbn: "9780000000002".to_string(),
                    title: "소년이 온다".to_string(),
                    author: "한강".to_string(),
                    publisher: "창비".to_string(),
                })
                .await;
            env
        }

        fn use_case(&self) -> UpdateReviewVectorsUseCase {
            UpdateReviewVectorsUseCase::new(
                self.reviews.clone(),
                self.books.clone(),
                self.book_vectors.clone(),
                self.profiles.clone(),
                Arc::new(EchoSummarizer),
                self.embedding.clone(),
                self.store.clone(),
            )
        }
    }

    #[tokio::test]
    async fn first_review_creates_profile_equal_to_its_embedding() {
        let env = Env::new().await;
        env.reviews
            .insert(Review {
                id: 10,
                title: "잊지 못할 이야기".to_string(),
                content: String::new(),
                user_id: 5,
                book_id: 2,
            })
            .await;

        let report = env.use_case().execute(10).await.unwrap();

        assert!(report.profile_updated);
        assert!(report.book_vector_updated);

        let profile = env.profiles.find_by_user(5).await.unwrap().expect("profile created");
        let expected = env.embedding.embed("잊지 못할 이야기").await.unwrap();
        assert_eq!(profile.vector, expected);

        assert!(env.book_vectors.find_by_book(2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn second_review_blends_with_alpha() {
        let env = Env::new().await;
        env.reviews
            .insert(Review {
                id: 10,
                title: "첫 리뷰".to_string(),
                content: String::new(),
                user_id: 5,
                book_id: 2,
            })
            .await;
        env.reviews
            .insert(Review {
                id: 11,
                title: "두번째 리뷰".to_string(),
                content: String::new(),
                user_id: 5,
                book_id: 2,
            })
            .await;

        let use_case = env.use_case();
        use_case.execute(10).await.unwrap();
        let first = env.profiles.find_by_user(5).await.unwrap().unwrap().vector;
        use_case.execute(11).await.unwrap();
        let second = env.profiles.find_by_user(5).await.unwrap().unwrap().vector;

        let review_emb = env.embedding.embed("두번째 리뷰").await.unwrap();
        let expected = blend_profile(&first, &review_emb, PROFILE_ALPHA);
        for (got, want) in second.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn dimension_mismatch_replaces_the_profile() {
        let env = Env::new().await;
        env.profiles
            .save(UserProfileRecord::new(5, vec![1.0; 4]))
            .await
            .unwrap();
        env.reviews
            .insert(Review {
                id: 10,
                title: "모델이 바뀐 뒤의 리뷰".to_string(),
                content: String::new(),
                user_id: 5,
                book_id: 2,
            })
            .await;

        env.use_case().execute(10).await.unwrap();

        let profile = env.profiles.find_by_user(5).await.unwrap().unwrap();
        let expected = env.embedding.embed("모델이 바뀐 뒤의 리뷰").await.unwrap();
        assert_eq!(profile.vector, expected);
    }

    #[tokio::test]
    async fn empty_review_text_still_recomputes_the_book_vector() {
        let env = Env::new().await;
        env.reviews
            .insert(Review {
                id: 20,
                title: "본문이 있는 리뷰".to_string(),
                content: "좋았다".to_string(),
                user_id: 6,
                book_id: 2,
            })
            .await;
        env.reviews
            .insert(Review {
                id: 21,
                title: String::new(),
                content: String::new(),
                user_id: 7,
                book_id: 2,
            })
            .await;

        let report = env.use_case().execute(21).await.unwrap();

        assert!(!report.profile_updated);
        assert!(report.book_vector_updated);
        assert!(env.profiles.find_by_user(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_review_is_a_no_op() {
        let env = Env::new().await;
        let report = env.use_case().execute(999).await.unwrap();
        assert_eq!(report, UpdateReport::default());
    }
}
