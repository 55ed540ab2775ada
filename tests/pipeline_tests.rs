//! End-to-end pipeline tests over the in-memory ports, a tempdir-backed
//! vector store, and deterministic mock services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use galpi::{
    Book, BookVectorRepository, BuildBookVectorUseCase, BuildOutcome, CrawledReview,
    EmbeddingService, FileVectorStore, InMemoryBookRepository, InMemoryBookVectorRepository,
    InMemoryReviewRepository, InMemoryUserProfileRepository, MockEmbedding, PipelineJob,
    PipelineQueue, RecommendBooksUseCase, Review, ReviewSource, SourceSummary, SourceType,
    Summarizer, UpdateReviewVectorsUseCase, UserProfileRepository, VectorStore,
};

struct StaticSource {
    source_type: SourceType,
    reviews: Vec<String>,
}

impl StaticSource {
    fn new(source_type: SourceType, reviews: &[&str]) -> Self {
        Self {
            source_type,
            reviews: reviews.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ReviewSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    async fn resolve_external_id(&self, _isbn: &str) -> Option<String> {
        if self.reviews.is_empty() {
            None
        } else {
            Some("external-1".to_string())
        }
    }

    async fn fetch_reviews(&self, _external_id: &str, isbn: &str) -> Vec<CrawledReview> {
        self.reviews
            .iter()
            .filter_map(|text| {
                CrawledReview::new(isbn, self.source_type, text.clone(), None, None, None)
            })
            .collect()
    }
}

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

struct TestEnv {
    books: Arc<InMemoryBookRepository>,
    reviews: Arc<InMemoryReviewRepository>,
    book_vectors: Arc<InMemoryBookVectorRepository>,
    profiles: Arc<InMemoryUserProfileRepository>,
    store: Arc<FileVectorStore>,
    embedding: Arc<MockEmbedding>,
    _dir: tempfile::TempDir,
}

async fn setup_test_env() -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(
        FileVectorStore::open(dir.path().join("vectordb"), "reviews_test").expect("store opens"),
    );

    let env = TestEnv {
        books: Arc::new(InMemoryBookRepository::new()),
        reviews: Arc::new(InMemoryReviewRepository::new()),
        book_vectors: Arc::new(InMemoryBookVectorRepository::new()),
        profiles: Arc::new(InMemoryUserProfileRepository::new()),
        store,
        embedding: Arc::new(MockEmbedding::with_dimensions(16)),
        _dir: dir,
    };

    for (id, isbn, title, author) in [
        (1, "9780000000001", "첫 번째 책", "김하나"),
        (2, "9780000000002", "두 번째 책", "이둘"),
        (3, "9780000000003", "세 번째 책", "박셋"),
    ] {
        env.books
            .insert(Book {
                id,
                isbn: isbn.to_string(),
                title: title.to_string(),
                author: author.to_string(),
                publisher: "출판사".to_string(),
            })
            .await;
    }

    env
}

fn build_use_case(env: &TestEnv, sources: Vec<Arc<dyn ReviewSource>>) -> BuildBookVectorUseCase {
    BuildBookVectorUseCase::new(
        env.books.clone(),
        env.book_vectors.clone(),
        sources,
        Arc::new(EchoSummarizer),
        env.embedding.clone(),
        env.store.clone(),
    )
}

fn update_use_case(env: &TestEnv) -> UpdateReviewVectorsUseCase {
    UpdateReviewVectorsUseCase::new(
        env.reviews.clone(),
        env.books.clone(),
        env.book_vectors.clone(),
        env.profiles.clone(),
        Arc::new(EchoSummarizer),
        env.embedding.clone(),
        env.store.clone(),
    )
}

fn recommend_use_case(env: &TestEnv) -> RecommendBooksUseCase {
    RecommendBooksUseCase::new(
        env.reviews.clone(),
        env.books.clone(),
        env.embedding.clone(),
        env.store.clone(),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn book_with_no_crawlable_reviews_gains_no_vector() {
    let env = setup_test_env().await;
    let sources: Vec<Arc<dyn ReviewSource>> = vec![
        Arc::new(StaticSource::new(SourceType::AladinShort, &[])),
        Arc::new(StaticSource::new(SourceType::KyoboPublisher, &[])),
    ];

    let outcome = build_use_case(&env, sources)
        .execute("9780000000001")
        .await
        .expect("pipeline runs");

    assert_eq!(outcome, BuildOutcome::SkippedNoContent);
    assert!(env.book_vectors.find_by_book(1).await.unwrap().is_none());
    assert!(env.store.query(&[0.0; 16], 10).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn review_creates_profile_and_upserts_book_vector() {
    let env = setup_test_env().await;
    env.reviews
        .insert(Review {
            id: 100,
            title: "잊지 못할 이야기".to_string(),
            content: String::new(),
            user_id: 42,
            book_id: 2,
        })
        .await;

    let report = update_use_case(&env).execute(100).await.expect("pipeline runs");

    assert!(report.profile_updated);
    assert!(report.book_vector_updated);

    let profile = env
        .profiles
        .find_by_user(42)
        .await
        .unwrap()
        .expect("profile row created");
    let expected = env.embedding.embed("잊지 못할 이야기").await.unwrap();
    assert_eq!(profile.vector, expected);

    let record = env
        .book_vectors
        .find_by_book(2)
        .await
        .unwrap()
        .expect("book vector upserted");
    assert_eq!(record.embedding_dim, record.vector.len());

    let hits = env.store.query(&record.vector, 1).await.unwrap();
    assert_eq!(hits[0].metadata.isbn, "9780000000002");
}

#[tokio::test(flavor = "multi_thread")]
async fn recommendations_exclude_the_source_book_and_keep_rank_order() {
    let env = setup_test_env().await;
    env.reviews
        .insert(Review {
            id: 100,
            title: "감정의 결이 깊은 리뷰".to_string(),
            content: String::new(),
            user_id: 42,
            book_id: 1,
        })
        .await;

    // Build vectors for all three books so the store is populated, with the
    // source book's vector closest to the review embedding.
    let review_text = "감정의 결이 깊은 리뷰";
    let query = env.embedding.embed(review_text).await.unwrap();
    for (isbn, book_text) in [
        ("9780000000001", review_text),
        ("9780000000002", "두 번째 책의 리뷰 묶음"),
        ("9780000000003", "세 번째 책의 리뷰 묶음"),
    ] {
        let sources: Vec<Arc<dyn ReviewSource>> =
            vec![Arc::new(StaticSource::new(SourceType::AladinShort, &[book_text]))];
        let outcome = build_use_case(&env, sources).execute(isbn).await.unwrap();
        assert_eq!(outcome, BuildOutcome::Completed);
    }

    let recommendation = recommend_use_case(&env).execute(100).await.unwrap();

    let isbns: Vec<&str> = recommendation
        .books
        .iter()
        .map(|b| b.book.isbn.as_str())
        .collect();
    assert!(!isbns.contains(&"9780000000001"), "own book must be excluded");
    assert_eq!(isbns.len(), 2);

    // Order must follow store distances.
    let hits = env.store.query(&query, 10).await.unwrap();
    let expected: Vec<&str> = hits
        .iter()
        .map(|h| h.metadata.isbn.as_str())
        .filter(|isbn| *isbn != "9780000000001")
        .collect();
    assert_eq!(isbns, expected);

    for recommended in &recommendation.books {
        assert!(!recommended.reason.is_empty());
        assert!(!recommended.reason.contains(&recommended.book.title));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_runs_submitted_jobs_in_the_background() {
    let env = setup_test_env().await;
    let sources: Vec<Arc<dyn ReviewSource>> =
        vec![Arc::new(StaticSource::new(SourceType::UserReview, &["큐에서 처리된 리뷰"]))];

    let queue = PipelineQueue::start(
        Arc::new(build_use_case(&env, sources)),
        Arc::new(update_use_case(&env)),
        2,
        8,
    );

    assert!(queue.submit(PipelineJob::BookCreated {
        isbn: "9780000000003".to_string(),
    }));

    // The trigger returns immediately; poll for the worker's result.
    let mut found = false;
    for _ in 0..50 {
        if env.book_vectors.find_by_book(3).await.unwrap().is_some() {
            found = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(found, "background worker should persist the vector");
}
