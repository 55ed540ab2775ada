use async_trait::async_trait;

use crate::domain::{CrawledReview, SourceType};

/// One external review channel, fetched best-effort.
///
/// Implementations never return errors: a network failure, a missing page
/// structure, or an empty result all come back as `None` / an empty list.
/// Sources share no state and the orchestrator runs them independently, so
/// one source failing completely never blocks the others.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Name used for logging.
    fn name(&self) -> &'static str;

    /// Discriminator the summarizer keys its prompt on.
    fn source_type(&self) -> SourceType;

    /// Map an ISBN to the source's own item/product identifier.
    async fn resolve_external_id(&self, isbn: &str) -> Option<String>;

    /// Fetch all reviews for a previously resolved identifier. Paginated
    /// sub-requests apply a fixed inter-request delay.
    async fn fetch_reviews(&self, external_id: &str, isbn: &str) -> Vec<CrawledReview>;
}
