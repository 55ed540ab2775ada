use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::application::{ChatClient, Summarizer};
use crate::domain::{SourceSummary, SourceType};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const TEMPERATURE: f32 = 0.3;

/// Bundle budgets. Simple bundles keep at most this many reviews and total
/// characters; the bucketed bundle applies the per-section cap instead.
const MAX_BUNDLE_REVIEWS: usize = 30;
const MAX_BUNDLE_CHARS: usize = 6000;
const MAX_PER_SECTION: usize = 20;

/// Reviews at or under this length are one-line impressions, not content
/// discussion.
const SHORT_OPINION_CHARS: usize = 80;

/// A mention of any of these marks a purchase/delivery review rather than a
/// reading experience.
const PURCHASE_KEYWORDS: &[&str] = &["배송", "포장", "상태", "빠르", "하자", "굿즈", "책상태"];

const SUMMARY_MARKER: &str = "요약:";
const SENTIMENT_MARKER: &str = "감정:";
const KEYWORDS_MARKER: &str = "키워드:";

/// LLM-backed [`Summarizer`]: bundles a source's review texts, sends one
/// chat-completion with a per-source Korean prompt, and slices the response
/// by its labeled markers.
///
/// Never fails: empty input skips the call entirely, and any request failure
/// yields the empty summary the pipelines treat as "nothing usable".
pub struct ReviewSummarizer {
    chat: Arc<dyn ChatClient>,
}

impl ReviewSummarizer {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Summarizer for ReviewSummarizer {
    async fn summarize(&self, source: SourceType, texts: &[String]) -> SourceSummary {
        let texts: Vec<&str> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            return SourceSummary::default();
        }

        let prompt = build_prompt(source, &texts);
        match self.chat.complete(SYSTEM_PROMPT, &prompt, TEMPERATURE).await {
            Ok(content) => parse_summary_response(&content),
            Err(e) => {
                warn!("summarize: {source} request failed: {e}");
                SourceSummary::default()
            }
        }
    }
}

fn build_prompt(source: SourceType, texts: &[&str]) -> String {
    match source {
        SourceType::AladinShort => format!(
            "너는 책 리뷰 분석 전문가다.\n\n\
             아래는 동일한 책에 대한 여러 독자 리뷰이다.\n\
             반드시 아래 형식을 정확히 지켜서 출력하라.\n\n\
             [출력 형식]\n\
             요약: 한글 4~5줄\n\
             감정: -1.0 ~ 1.0 사이 소수점 숫자 하나\n\
             키워드: 키워드1, 키워드2, 키워드3, 키워드4, 키워드5\n\n\
             [리뷰 목록]\n{}",
            simple_bundle(texts, false)
        ),
        SourceType::KyoboReader => format!(
            "너는 책 리뷰 요약 전문가다.\n\n\
             아래는 서점에서 수집한 동일한 책에 대한 리뷰이다.\n\
             리뷰는 길이와 성격이 다양하며, 일부는 짧은 한줄평이거나\n\
             구매/배송 관련 언급일 수 있다.\n\n\
             요약 시 지침:\n\
             - 책의 내용, 주제, 문체, 전반적 독서 경험을 중심으로 요약하라\n\
             - 짧은 감상은 분위기를 보조하는 용도로 반영하라\n\
             - 구매/배송 언급은 핵심 평가가 아닐 경우 최소화하라\n\n\
             반드시 아래 형식을 정확히 지켜서 출력하라.\n\n\
             [출력 형식]\n\
             요약: 한글 4~5줄\n\
             감정: -1.0 ~ 1.0 사이 소수점 숫자 하나\n\
             키워드: 키워드1, 키워드2, 키워드3, 키워드4, 키워드5\n\n\
             [리뷰 목록]\n{}",
            bucketed_bundle(texts)
        ),
        SourceType::KyoboPublisher => format!(
            "너는 도서 추천 시스템을 위한 책 소개 요약 전문가다.\n\n\
             아래 텍스트는 한 권의 책을 설명하기 위해 제공된 자료로,\n\
             줄거리, 출판사 서평, 추천사, 수상 이력, 평론가 코멘트 등이\n\
             뒤섞여 있을 수 있다.\n\n\
             요약 지침:\n\
             - 이 책이 어떤 책인지 핵심적으로 설명하라\n\
             - 소설의 경우 사건 전개나 결말은 언급하지 마라\n\
             - 책의 주제, 배경, 분위기, 문제의식, 독서 경험을 중심으로 정리하라\n\
             - 수상 이력, 인용문, 추천사 문장은 직접 인용하지 말고 의미만 반영하라\n\
             - 마케팅 문구나 과장된 표현은 중립적으로 정제하라\n\
             - 독자가 검색창에 입력할 법한 표현으로 작성하라\n\n\
             반드시 아래 형식을 정확히 지켜서 출력하라.\n\n\
             [출력 형식]\n\
             요약: 한글 4~5문장\n\
             감정: -1.0 ~ 1.0 사이 소수점 숫자 하나\n\
             키워드: 키워드1, 키워드2, 키워드3, 키워드4, 키워드5\n\n\
             [책 소개 원문]\n{}",
            simple_bundle(texts, false)
        ),
        SourceType::UserReview => format!(
            "당신은 독서 커뮤니티의 유저 리뷰 요약 전문가입니다.\n\n\
             아래는 동일한 책에 대해 여러 사용자가 남긴 리뷰입니다.\n\
             판매/배송/구매 경험보다는 실제 독서 경험과 취향, 감상 포인트를 중심으로 요약해주세요.\n\n\
             반드시 아래 형식으로 출력하세요.\n\n\
             [출력 형식]\n\
             요약: 4~5문장\n\
             감정: -1.0 ~ 1.0 사이의 숫자 하나\n\
             키워드: 키워드, 키워드, 키워드, 키워드, 키워드\n\n\
             [리뷰 목록]\n{}",
            simple_bundle(texts, true)
        ),
    }
}

/// Join reviews newline-separated up to the bundle budgets, optionally as
/// `- ` bullets.
fn simple_bundle(texts: &[&str], bulleted: bool) -> String {
    let mut buf = Vec::new();
    let mut total = 0;
    for text in texts.iter().take(MAX_BUNDLE_REVIEWS) {
        total += text.chars().count();
        if total > MAX_BUNDLE_CHARS {
            break;
        }
        if bulleted {
            buf.push(format!("- {text}"));
        } else {
            buf.push((*text).to_string());
        }
    }
    buf.join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReviewBucket {
    ContentReview,
    ShortOpinion,
    PurchaseReview,
}

/// Separate actual content discussion from one-liners and purchase/delivery
/// chatter so the prompt can weight them differently.
pub(crate) fn classify_review(text: &str) -> ReviewBucket {
    let text = text.trim();
    if text.chars().count() <= SHORT_OPINION_CHARS {
        return ReviewBucket::ShortOpinion;
    }
    if PURCHASE_KEYWORDS.iter().any(|k| text.contains(k)) {
        return ReviewBucket::PurchaseReview;
    }
    ReviewBucket::ContentReview
}

fn bucketed_bundle(texts: &[&str]) -> String {
    let mut content = Vec::new();
    let mut short = Vec::new();
    let mut purchase = Vec::new();

    for text in texts {
        match classify_review(text) {
            ReviewBucket::ContentReview => content.push(*text),
            ReviewBucket::ShortOpinion => short.push(*text),
            ReviewBucket::PurchaseReview => purchase.push(*text),
        }
    }

    let join_with_limit = |items: &[&str]| {
        let mut buf = Vec::new();
        let mut total = 0;
        for text in items.iter().take(MAX_PER_SECTION) {
            total += text.chars().count();
            if total > MAX_BUNDLE_CHARS {
                break;
            }
            buf.push(format!("- {text}"));
        }
        buf.join("\n")
    };

    format!(
        "[콘텐츠 평가 리뷰]\n{}\n\n[짧은 감상 / 한줄평]\n{}\n\n[구매·배송 관련 언급]\n{}",
        join_with_limit(&content),
        join_with_limit(&short),
        join_with_limit(&purchase),
    )
}

/// Slice the model output between the three labeled markers. A missing
/// marker yields an empty field; fields end at the next *following* marker
/// so reordered output still parses.
pub(crate) fn parse_summary_response(content: &str) -> SourceSummary {
    SourceSummary {
        summary: field_after(content, SUMMARY_MARKER),
        sentiment: field_after(content, SENTIMENT_MARKER),
        keywords: field_after(content, KEYWORDS_MARKER),
    }
}

fn field_after(content: &str, marker: &str) -> String {
    let Some(start) = content.find(marker).map(|i| i + marker.len()) else {
        return String::new();
    };
    let rest = &content[start..];

    let mut end = rest.len();
    for other in [SUMMARY_MARKER, SENTIMENT_MARKER, KEYWORDS_MARKER] {
        if other == marker {
            continue;
        }
        if let Some(pos) = rest.find(other) {
            end = end.min(pos);
        }
    }
    rest[..end].trim().to_string()
}
