use serde::{Deserialize, Serialize};

use crate::domain::text;

/// Book record as exposed by the external catalog store. Only the fields the
/// recommendation pipeline consumes are carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    /// ISBN-13. Books without one are excluded from the vector pipeline.
    #[serde(default)]
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
}

impl Book {
    pub fn has_isbn(&self) -> bool {
        !self.isbn.trim().is_empty()
    }
}

/// Reader review as exposed by the external review store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub user_id: i64,
    pub book_id: i64,
}

impl Review {
    /// Embeddable text of a review: trimmed title and content joined by a
    /// single space, empty parts skipped.
    pub fn text(&self) -> String {
        let parts: Vec<&str> = [self.title.trim(), self.content.trim()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        text::clean(&parts.join(" "))
    }
}
