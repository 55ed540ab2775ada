mod book_repository;
mod chat_client;
mod embedding_service;
mod review_source;
mod summarizer;
mod vector_record_repository;
mod vector_store;

pub use book_repository::*;
pub use chat_client::*;
pub use embedding_service::*;
pub use review_source::*;
pub use summarizer::*;
pub use vector_record_repository::*;
pub use vector_store::*;
