use serde::{Deserialize, Serialize};

/// Which external channel a review bundle came from. The summarizer selects
/// its prompt and bundling heuristics by this discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Short reader comments from the Aladin community feed.
    AladinShort,
    /// Reader reviews from the Kyobo product page.
    KyoboReader,
    /// Publisher / editorial copy from the Kyobo product detail sections.
    KyoboPublisher,
    /// Reviews written inside this service.
    UserReview,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AladinShort => "aladin_short",
            Self::KyoboReader => "kyobo_review",
            Self::KyoboPublisher => "kyobo_publisher",
            Self::UserReview => "user_review",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw review fetched from an external source. Constructed only through
/// [`CrawledReview::new`], which rejects records without usable text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledReview {
    pub isbn: String,
    pub source: SourceType,
    pub review_text: String,
    pub rating: Option<u8>,
    pub review_date: Option<String>,
    pub permalink: Option<String>,
}

impl CrawledReview {
    /// Returns `None` when the review text is empty after trimming; crawlers
    /// drop such records instead of forwarding noise.
    pub fn new(
        isbn: impl Into<String>,
        source: SourceType,
        review_text: impl Into<String>,
        rating: Option<u8>,
        review_date: Option<String>,
        permalink: Option<String>,
    ) -> Option<Self> {
        let review_text = review_text.into().trim().to_string();
        if review_text.is_empty() {
            return None;
        }
        Some(Self {
            isbn: isbn.into(),
            source,
            review_text,
            rating,
            review_date,
            permalink,
        })
    }
}
