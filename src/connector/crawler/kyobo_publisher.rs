use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::application::ReviewSource;
use crate::domain::{CrawledReview, SourceType};

use super::{default_client, resolve_kyobo_product_id};

const DETAIL_URL: &str = "https://product.kyobobook.co.kr/detail";

/// Sections of the product detail page worth summarizing. Shorter blobs are
/// navigation remnants, not editorial copy.
const MIN_SECTION_CHARS: usize = 50;
const SECTIONS: &[&str] = &["book_contents", "book_publish_review", "book_recommend"];

/// Publisher and editorial copy from the Kyobo product detail page: book
/// introduction, publisher review, and recommendation sections. One crawled
/// record per non-trivial section.
pub struct KyoboPublisherPages {
    client: reqwest::Client,
}

impl KyoboPublisherPages {
    pub fn new() -> Self {
        Self {
            client: default_client(),
        }
    }
}

impl Default for KyoboPublisherPages {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewSource for KyoboPublisherPages {
    fn name(&self) -> &'static str {
        "kyobo-publisher"
    }

    fn source_type(&self) -> SourceType {
        SourceType::KyoboPublisher
    }

    async fn resolve_external_id(&self, isbn: &str) -> Option<String> {
        resolve_kyobo_product_id(&self.client, isbn).await
    }

    async fn fetch_reviews(&self, external_id: &str, isbn: &str) -> Vec<CrawledReview> {
        let url = format!("{DETAIL_URL}/{external_id}");
        let Ok(response) = self.client.get(&url).send().await else {
            return Vec::new();
        };
        if !response.status().is_success() {
            return Vec::new();
        }
        let Ok(body) = response.text().await else {
            return Vec::new();
        };

        let sections = parse_detail_sections(&body, isbn);
        if sections.is_empty() {
            debug!("kyobo-publisher: no usable sections for product {external_id}");
        }
        sections
    }
}

pub(crate) fn parse_detail_sections(body: &str, isbn: &str) -> Vec<CrawledReview> {
    let document = Html::parse_document(body);

    SECTIONS
        .iter()
        .filter_map(|section| {
            let selector = Selector::parse(&format!(
                "div.product_detail_area.{section} div.auto_overflow_inner > p.info_text"
            ))
            .ok()?;
            let text = document
                .select(&selector)
                .next()
                .map(|p| p.text().collect::<String>().trim().to_string())?;
            if text.chars().count() < MIN_SECTION_CHARS {
                return None;
            }
            CrawledReview::new(isbn, SourceType::KyoboPublisher, text, None, None, None)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_extracted_when_long_enough() {
        let body = format!(
            r#"
            <div class="product_detail_area book_publish_review">
              <div class="auto_overflow_inner"><p class="info_text">{}</p></div>
            </div>
            <div class="product_detail_area book_contents">
              <div class="auto_overflow_inner"><p class="info_text">짧음</p></div>
            </div>"#,
            "한 시대의 아픔을 정면으로 마주한 작품으로, 출판사가 오래 공들여 소개해 온 소설이다. 문장 하나하나가 묵직하게 다가온다."
        );

        let sections = parse_detail_sections(&body, "9788936434120");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].source, SourceType::KyoboPublisher);
        assert!(sections[0].review_text.contains("출판사"));
    }

    #[test]
    fn missing_sections_yield_nothing() {
        assert!(parse_detail_sections("<html><body></body></html>", "isbn").is_empty());
    }
}
