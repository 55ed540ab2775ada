mod cached_embedding;
mod file_vector_store;
mod in_memory;
mod mock_embedding;
mod openai_chat_client;
mod openai_embedding;
mod review_summarizer;

pub use cached_embedding::*;
pub use file_vector_store::*;
pub use in_memory::*;
pub use mock_embedding::*;
pub use openai_chat_client::*;
pub use openai_embedding::*;
pub use review_summarizer::*;
