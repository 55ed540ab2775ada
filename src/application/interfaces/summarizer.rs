use async_trait::async_trait;

use crate::domain::{SourceSummary, SourceType};

/// Summarizes one source's review bundle into a short text plus auxiliary
/// sentiment/keyword fields.
///
/// This interface deliberately has no error channel: empty input, a missing
/// credential, or any request failure all yield the empty summary, and call
/// sites skip the downstream steps that depend on it.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, source: SourceType, texts: &[String]) -> SourceSummary;
}
