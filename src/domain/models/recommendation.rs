use serde::Serialize;

use crate::domain::models::Book;

/// One recommended book with its synthesized one-sentence reason.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendedBook {
    #[serde(flatten)]
    pub book: Book,
    pub reason: String,
}

/// Full recommendation payload for one review, books in similarity-rank
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub review_id: i64,
    pub keywords: Vec<String>,
    pub books: Vec<RecommendedBook>,
}
