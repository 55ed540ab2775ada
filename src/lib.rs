pub mod application;
pub mod connector;
pub mod domain;

pub use application::{
    BookRepository, BookVectorRepository, BuildBookVectorUseCase, BuildOutcome, ChatClient,
    EmbeddingService, PipelineJob, PipelineQueue, RecommendBooksUseCase, ReviewRepository,
    ReviewSource, Summarizer, UpdateReport, UpdateReviewVectorsUseCase, UserProfileRepository,
    VectorStore,
};

pub use connector::adapter::{
    CachedEmbedding, EmbedCache, FileVectorStore, InMemoryBookRepository,
    InMemoryBookVectorRepository, InMemoryReviewRepository, InMemoryUserProfileRepository,
    InMemoryVectorStore, MockEmbedding, OpenAiChatClient, OpenAiEmbedding, ReviewSummarizer,
};

pub use connector::api::{router, serve, AppState, Container, ContainerConfig};

pub use domain::{
    Book, BookVectorRecord, CrawledReview, DomainError, Recommendation, RecommendedBook, Review,
    SourceSummary, SourceType, UserProfileRecord, VectorEntry, VectorHit, VectorMetadata,
};
