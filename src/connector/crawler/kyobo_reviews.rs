use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::application::ReviewSource;
use crate::domain::{CrawledReview, SourceType};

use super::{default_client, resolve_kyobo_product_id};

const REVIEW_API_URL: &str = "https://product.kyobobook.co.kr/api/review/list";

const MAX_PAGES: usize = 5;
const PAGE_SIZE: usize = 10;
const PAGE_DELAY: Duration = Duration::from_millis(1000);

/// Reader reviews from the Kyobo product page, fetched through the review
/// list JSON endpoint the page itself calls. Field extraction is loose on
/// purpose: anything that does not look like a review is skipped, and an
/// unexpected payload shape just ends the pagination.
pub struct KyoboReaderReviews {
    client: reqwest::Client,
}

impl KyoboReaderReviews {
    pub fn new() -> Self {
        Self {
            client: default_client(),
        }
    }
}

impl Default for KyoboReaderReviews {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewSource for KyoboReaderReviews {
    fn name(&self) -> &'static str {
        "kyobo"
    }

    fn source_type(&self) -> SourceType {
        SourceType::KyoboReader
    }

    async fn resolve_external_id(&self, isbn: &str) -> Option<String> {
        resolve_kyobo_product_id(&self.client, isbn).await
    }

    async fn fetch_reviews(&self, external_id: &str, isbn: &str) -> Vec<CrawledReview> {
        let mut reviews = Vec::new();

        for page in 1..=MAX_PAGES {
            if page > 1 {
                tokio::time::sleep(PAGE_DELAY).await;
            }

            let url = format!(
                "{REVIEW_API_URL}?page={page}&pageLimit={PAGE_SIZE}\
                 &saleCmdtid={external_id}&sortType=001&revwPatrCode=000"
            );
            let Ok(response) = self.client.get(&url).send().await else { break };
            if !response.status().is_success() {
                break;
            }
            let Ok(payload) = response.json::<Value>().await else { break };

            let page_reviews = parse_review_list(&payload, isbn);
            if page_reviews.is_empty() {
                debug!("kyobo: page {page} empty for product {external_id}, stopping");
                break;
            }
            reviews.extend(page_reviews);
        }

        reviews
    }
}

/// Pull reviews out of the list payload wherever it keeps them
/// (`data.reviewList` on the current page, `reviewList` on older ones).
pub(crate) fn parse_review_list(payload: &Value, isbn: &str) -> Vec<CrawledReview> {
    let items = payload
        .pointer("/data/reviewList")
        .or_else(|| payload.pointer("/reviewList"))
        .and_then(Value::as_array);

    let Some(items) = items else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let text = item
                .get("revwCntt")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let rating = item
                .get("revwRvgr")
                .and_then(Value::as_u64)
                .map(|r| r.min(10) as u8);
            let date = item
                .get("cretDttm")
                .and_then(Value::as_str)
                .map(str::to_string);
            CrawledReview::new(isbn, SourceType::KyoboReader, text, rating, date, None)
        })
        .collect()
}
