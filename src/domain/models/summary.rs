use serde::{Deserialize, Serialize};

/// Result of summarizing one source's review bundle. All fields are raw
/// model output; only `summary` flows into the embedding pipeline, the
/// sentiment score and keyword list are kept for inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub summary: String,
    pub sentiment: String,
    pub keywords: String,
}

impl SourceSummary {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.sentiment.is_empty() && self.keywords.is_empty()
    }
}
