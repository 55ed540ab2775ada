//! Best-effort review-source crawlers.
//!
//! Each source is fully independent: its own client, its own pagination,
//! its own failure handling. Nothing in here returns an error — a source
//! that cannot resolve a book or parse a page simply contributes zero
//! reviews.

mod aladin;
mod kyobo_publisher;
mod kyobo_reviews;

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;

use crate::application::ReviewSource;

pub use aladin::AladinShortReviews;
pub use kyobo_publisher::KyoboPublisherPages;
pub use kyobo_reviews::KyoboReaderReviews;

pub(crate) const USER_AGENT: &str = "Mozilla/5.0";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// All sources the build pipeline fans out over, in the order their
/// summaries are merged.
pub fn default_sources() -> Vec<Arc<dyn ReviewSource>> {
    vec![
        Arc::new(AladinShortReviews::new()),
        Arc::new(KyoboReaderReviews::new()),
        Arc::new(KyoboPublisherPages::new()),
    ]
}

/// Kyobo product ids look like `/detail/S000201234567` in search results.
pub(crate) fn kyobo_product_id_from_html(body: &str) -> Option<String> {
    let re = Regex::new(r"/detail/(S\d{12})").ok()?;
    re.captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolve an ISBN to a Kyobo product id via the search page. Shared by the
/// reader-review and publisher-page sources.
pub(crate) async fn resolve_kyobo_product_id(
    client: &reqwest::Client,
    isbn: &str,
) -> Option<String> {
    let url = format!("https://search.kyobobook.co.kr/search?keyword={isbn}&target=total");
    let response = client.get(&url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body = response.text().await.ok()?;
    kyobo_product_id_from_html(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_is_extracted_from_search_markup() {
        let body = r#"<a href="https://product.kyobobook.co.kr/detail/S000200123456">도서</a>"#;
        assert_eq!(
            kyobo_product_id_from_html(body),
            Some("S000200123456".to_string())
        );
    }

    #[test]
    fn product_id_requires_the_full_pattern() {
        assert!(kyobo_product_id_from_html("/detail/X000200123456").is_none());
        assert!(kyobo_product_id_from_html("/detail/S123").is_none());
        assert!(kyobo_product_id_from_html("no links here").is_none());
    }
}
