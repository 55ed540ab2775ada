//! Drives the axum router in-process and checks the response envelopes.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use galpi::{
    AppState, Book, BuildBookVectorUseCase, DomainError, EmbeddingService,
    InMemoryBookRepository, InMemoryBookVectorRepository, InMemoryReviewRepository,
    InMemoryUserProfileRepository, InMemoryVectorStore, MockEmbedding, PipelineQueue,
    RecommendBooksUseCase, Review, ReviewSource, SourceSummary, SourceType, Summarizer,
    UpdateReviewVectorsUseCase, VectorEntry, VectorMetadata, VectorStore,
};

struct EmptySummarizer;

#[async_trait]
impl Summarizer for EmptySummarizer {
    async fn summarize(&self, _source: SourceType, _texts: &[String]) -> SourceSummary {
        SourceSummary::default()
    }
}

struct FailingEmbedding;

#[async_trait]
impl EmbeddingService for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, DomainError> {
        Err(DomainError::embedding("upstream unavailable"))
    }

    fn model_key(&self) -> &str {
        "failing::embedding"
    }
}

struct TestEnv {
    books: Arc<InMemoryBookRepository>,
    reviews: Arc<InMemoryReviewRepository>,
    store: Arc<InMemoryVectorStore>,
    embedding: Arc<MockEmbedding>,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            books: Arc::new(InMemoryBookRepository::new()),
            reviews: Arc::new(InMemoryReviewRepository::new()),
            store: Arc::new(InMemoryVectorStore::new()),
            embedding: Arc::new(MockEmbedding::with_dimensions(16)),
        }
    }

    fn state(&self) -> AppState {
        self.state_with_embedding(self.embedding.clone())
    }

    fn state_with_embedding(&self, embedding: Arc<dyn EmbeddingService>) -> AppState {
        let book_vectors = Arc::new(InMemoryBookVectorRepository::new());
        let profiles = Arc::new(InMemoryUserProfileRepository::new());

        let build = BuildBookVectorUseCase::new(
            self.books.clone(),
            book_vectors.clone(),
            Vec::new(),
            Arc::new(EmptySummarizer),
            embedding.clone(),
            self.store.clone(),
        );
        let update = UpdateReviewVectorsUseCase::new(
            self.reviews.clone(),
            self.books.clone(),
            book_vectors,
            profiles,
            Arc::new(EmptySummarizer),
            embedding.clone(),
            self.store.clone(),
        );
        let recommend = RecommendBooksUseCase::new(
            self.reviews.clone(),
            self.books.clone(),
            embedding,
            self.store.clone(),
        );

        AppState {
            recommend: Arc::new(recommend),
            queue: PipelineQueue::start(Arc::new(build), Arc::new(update), 1, 4),
        }
    }

    async fn seed_book(&self, id: i64, isbn: &str, title: &str) {
        self.books
            .insert(Book {
                id,
                isbn: isbn.to_string(),
                title: title.to_string(),
                author: "작가".to_string(),
                publisher: "출판사".to_string(),
            })
            .await;
    }

    async fn seed_review(&self, id: i64, book_id: i64, title: &str, content: &str) {
        self.reviews
            .insert(Review {
                id,
                title: title.to_string(),
                content: content.to_string(),
                user_id: 1,
                book_id,
            })
            .await;
    }
}

async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = galpi::router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");

    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_review_returns_404_envelope() {
    let env = TestEnv::new();
    let (status, body) = get(env.state(), "/api/recommendations/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_review_returns_400_envelope() {
    let env = TestEnv::new();
    env.seed_book(1, "9780000000001", "원본 책").await;
    env.seed_review(7, 1, "", "").await;

    let (status, body) = get(env.state(), "/api/recommendations/7").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "empty_review");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn embedding_failure_returns_502_envelope() {
    let env = TestEnv::new();
    env.seed_book(1, "9780000000001", "원본 책").await;
    env.seed_review(7, 1, "읽을 만한 리뷰", "").await;

    let state = env.state_with_embedding(Arc::new(FailingEmbedding));
    let (status, body) = get(state, "/api/recommendations/7").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "embedding_failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn successful_recommendation_carries_keywords_and_reasons() {
    let env = TestEnv::new();
    env.seed_book(1, "9780000000001", "원본 책").await;
    env.seed_book(2, "9780000000002", "이웃 책").await;
    env.seed_review(7, 1, "광주의 아픔을 기억하며", "무거운 여운이 남는다").await;

    let embedding = env.embedding.embed("이웃 책의 요약").await.unwrap();
    env.store
        .upsert(VectorEntry {
            id: "9780000000002".to_string(),
            document: "이웃 책의 요약".to_string(),
            metadata: VectorMetadata {
                isbn: "9780000000002".to_string(),
                embedding_model: "mock::embedding".to_string(),
            },
            embedding,
        })
        .await
        .unwrap();

    let (status, body) = get(env.state(), "/api/recommendations/7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["review_id"], 7);
    assert!(body["keywords"].as_array().is_some_and(|k| !k.is_empty()));

    let books = body["books"].as_array().expect("books array");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["isbn"], "9780000000002");
    assert!(books[0]["reason"].as_str().is_some_and(|r| !r.is_empty()));
}

#[tokio::test(flavor = "multi_thread")]
async fn triggers_are_accepted_immediately() {
    let env = TestEnv::new();
    let state = env.state();

    let response = galpi::router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/books/9780000000001/vector")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = galpi::router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/reviews/7/vector")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}
