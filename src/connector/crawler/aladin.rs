use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::application::ReviewSource;
use crate::domain::{CrawledReview, SourceType};

use super::default_client;

const SEARCH_URL: &str = "https://www.aladin.co.kr/search/wsearchresult.aspx";
const AJAX_URL: &str = "https://www.aladin.co.kr/ucl/shop/product/ajax/GetCommunityListAjax.aspx";

const MAX_PAGES: usize = 5;
const PAGE_SIZE: usize = 10;
/// Fixed pause between paginated AJAX requests.
const PAGE_DELAY: Duration = Duration::from_millis(1500);

/// Short reader comments ("100자평") from the Aladin community feed.
///
/// Resolution scrapes the search result for the first product box and pulls
/// the item id out of its product link; fetching walks the community-list
/// AJAX endpoint page by page until a page comes back empty.
pub struct AladinShortReviews {
    client: reqwest::Client,
}

impl AladinShortReviews {
    pub fn new() -> Self {
        Self {
            client: default_client(),
        }
    }
}

impl Default for AladinShortReviews {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewSource for AladinShortReviews {
    fn name(&self) -> &'static str {
        "aladin"
    }

    fn source_type(&self) -> SourceType {
        SourceType::AladinShort
    }

    async fn resolve_external_id(&self, isbn: &str) -> Option<String> {
        let url = format!("{SEARCH_URL}?SearchTarget=Book&SearchWord={isbn}");
        let response = self.client.get(&url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().await.ok()?;
        let item_id = item_id_from_search(&body);
        if item_id.is_none() {
            debug!("aladin: no product box for ISBN {isbn}");
        }
        item_id
    }

    async fn fetch_reviews(&self, external_id: &str, isbn: &str) -> Vec<CrawledReview> {
        let mut reviews = Vec::new();

        for page in 1..=MAX_PAGES {
            if page > 1 {
                tokio::time::sleep(PAGE_DELAY).await;
            }

            let url = format!(
                "{AJAX_URL}?ProductItemId={external_id}&itemId={external_id}\
                 &pageCount={PAGE_SIZE}&communitytype=CommentReview&nemoType=-1\
                 &page={page}&startNumber=1&endNumber={PAGE_SIZE}&sort=2\
                 &IsOrderer=1&BranchType=1&IsAjax=true&pageType=0"
            );
            let request = self
                .client
                .get(&url)
                .header(
                    "Referer",
                    format!("https://www.aladin.co.kr/shop/wproduct.aspx?ItemId={external_id}"),
                )
                .header("X-Requested-With", "XMLHttpRequest");

            let Ok(response) = request.send().await else { break };
            if !response.status().is_success() {
                break;
            }
            let Ok(body) = response.text().await else { break };

            let page_reviews = parse_comment_page(&body, isbn);
            if page_reviews.is_empty() {
                debug!("aladin: page {page} empty for item {external_id}, stopping");
                break;
            }
            reviews.extend(page_reviews);
        }

        reviews
    }
}

/// First product box on the search page carries the item link.
fn item_id_from_search(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let box_selector = Selector::parse("div.ss_book_box").ok()?;
    let link_selector = Selector::parse("a[href*='wproduct.aspx?ItemId=']").ok()?;

    let product_box = document.select(&box_selector).next()?;
    let link = product_box.select(&link_selector).next()?;
    item_id_from_href(link.value().attr("href")?)
}

pub(crate) fn item_id_from_href(href: &str) -> Option<String> {
    let (_, tail) = href.split_once("ItemId=")?;
    let id: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// The AJAX fragment interleaves content and metadata `<li>` blocks; walk
/// them pairwise.
fn parse_comment_page(body: &str, isbn: &str) -> Vec<CrawledReview> {
    let document = Html::parse_fragment(body);
    let Ok(li_selector) = Selector::parse("li") else {
        return Vec::new();
    };
    let items: Vec<ElementRef> = document.select(&li_selector).collect();

    let mut reviews = Vec::new();
    for pair in items.chunks(2) {
        let content_li = pair[0];
        let meta_li = pair.get(1).copied();

        let Some(text) = comment_text(content_li) else { continue };
        let rating = star_rating(content_li);
        let permalink = blog_link(content_li);
        let review_date = meta_li.and_then(review_date);

        if let Some(review) = CrawledReview::new(
            isbn,
            SourceType::AladinShort,
            text,
            rating,
            review_date,
            permalink,
        ) {
            reviews.push(review);
        }
    }
    reviews
}

/// Comment body spans carry ids like `spnPaper123`; spoiler-hidden variants
/// carry `Spoiler` in the id and are skipped.
fn comment_text(li: ElementRef) -> Option<String> {
    let selector = Selector::parse("span[id^='spnPaper']").ok()?;
    li.select(&selector)
        .find(|span| {
            span.value()
                .attr("id")
                .map(|id| !id.contains("Spoiler"))
                .unwrap_or(false)
        })
        .map(|span| span.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Five star slots, two points each; lit ones use the `icon_star_on` asset.
fn star_rating(li: ElementRef) -> Option<u8> {
    let selector = Selector::parse("div.HL_star img").ok()?;
    let lit = li
        .select(&selector)
        .filter(|img| {
            img.value()
                .attr("src")
                .map(|src| src.contains("icon_star_on"))
                .unwrap_or(false)
        })
        .count();
    if lit == 0 {
        None
    } else {
        Some((lit * 2).min(10) as u8)
    }
}

fn blog_link(li: ElementRef) -> Option<String> {
    let selector = Selector::parse("a[href*='blog.aladin.co.kr']").ok()?;
    li.select(&selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

fn review_date(li: ElementRef) -> Option<String> {
    let selector = Selector::parse("div.left span").ok()?;
    li.select(&selector)
        .next()
        .map(|span| span.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}
