//! One-sentence recommendation reasons.
//!
//! Layered and deterministic: same-author beats everything, then the curated
//! keyword table, then a template over the rotated keyword list, then a
//! generic fallback. An optional LLM pass may rewrite the templated
//! sentences afterwards, but every rewrite has to pass the safety filter or
//! the templated sentence stands.

use regex::Regex;
use serde_json::json;
use tracing::warn;

use crate::application::use_cases::keywords::parse_json_array;
use crate::application::ChatClient;
use crate::domain::Book;

const SAME_AUTHOR_REASON: &str = "같은 작가의 다른 작품이에요.";
const GENERIC_REASON: &str = "리뷰 분위기와 잘 맞는 책이에요.";

const REFINE_SYSTEM: &str = "You are a helpful assistant.";
const REFINE_TEMPERATURE: f32 = 0.2;

/// Canonical keyword → ready-made sentence. First keyword with a mapping
/// wins.
const KEYWORD_REASONS: &[(&str, &str)] = &[
    ("역사적 사건", "아픈 역사적 사건을 담담한 문체로 풀어냈어요."),
    ("아픔의 기억", "아픔의 기억을 조용히 들여다보는 책이에요."),
    ("무거운 분위기", "무거운 분위기를 끝까지 놓지 않고 이어가요."),
    ("기억", "기억을 곱씹게 되는 책이에요."),
    ("슬픔", "슬픔의 결을 차분히 따라가는 책이에요."),
    ("분노", "분노의 감정을 절제된 문장으로 담아냈어요."),
    ("소년", "소년의 시선과 정서를 떠올리게 해요."),
    ("잔인함", "잔인한 현실을 담담하게 비추는 책이에요."),
    ("감정", "감정의 흐름을 섬세하게 따라가요."),
    ("여운", "읽고 난 뒤 여운이 오래 남는 책이에요."),
];

/// Build the reason for one candidate, `index` being its similarity rank.
pub fn reason_for_book(candidate: &Book, source_book: &Book, keywords: &[String], index: usize) -> String {
    let candidate_author = normalize_author(&candidate.author);
    let source_author = normalize_author(&source_book.author);
    if !candidate_author.is_empty() && candidate_author == source_author {
        return SAME_AUTHOR_REASON.to_string();
    }

    if let Some(mapped) = keyword_mapped_reason(&rotate(keywords, index)) {
        return mapped;
    }

    if !keywords.is_empty() {
        let keyword = &keywords[index % keywords.len()];
        return format!("리뷰에서 느낀 '{keyword}' 분위기와 잘 맞는 책이에요.");
    }

    GENERIC_REASON.to_string()
}

/// Strip parenthetical annotations and every whitespace character, so
/// "한강 (지은이)" and "한 강" compare equal.
pub fn normalize_author(name: &str) -> String {
    let without_parens = Regex::new(r"\(.*?\)")
        .map(|re| re.replace_all(name, "").into_owned())
        .unwrap_or_else(|_| name.to_string());
    without_parens.split_whitespace().collect()
}

/// True when the reason neither uses a forbidden marker nor quotes the
/// candidate's own title or author verbatim.
pub fn is_reason_safe(reason: &str, title: &str, author: &str) -> bool {
    if reason.is_empty() {
        return false;
    }

    const FORBIDDEN_MARKERS: &[&str] = &["제목", "저자", "title:", "author:"];
    if FORBIDDEN_MARKERS.iter().any(|m| reason.contains(m)) {
        return false;
    }

    let title = title.trim();
    if !title.is_empty() && reason.contains(title) {
        return false;
    }
    let author = author.trim();
    if !author.is_empty() && reason.contains(author) {
        return false;
    }
    true
}

/// True when the reason quotes at least one extracted keyword verbatim.
pub fn has_keyword(reason: &str, keywords: &[String]) -> bool {
    !reason.is_empty() && keywords.iter().any(|k| !k.is_empty() && reason.contains(k))
}

/// Rotate so that candidate `index` leads with a different keyword than its
/// neighbors.
pub fn rotate(keywords: &[String], index: usize) -> Vec<String> {
    if keywords.is_empty() || index == 0 {
        return keywords.to_vec();
    }
    let pivot = index % keywords.len();
    let mut rotated = keywords[pivot..].to_vec();
    rotated.extend_from_slice(&keywords[..pivot]);
    rotated
}

fn keyword_mapped_reason(keywords: &[String]) -> Option<String> {
    for keyword in keywords {
        if let Some((_, sentence)) = KEYWORD_REASONS.iter().find(|(k, _)| k == keyword) {
            return Some((*sentence).to_string());
        }
    }
    None
}

/// Optional post-pass: offer the templated reasons to the LLM for a warmer
/// rewrite. Returns the merged list — for each candidate, the rewrite if it
/// is safe and keyword-bearing, otherwise the original templated sentence.
/// Any failure leaves the input untouched.
pub async fn refine_reasons(
    chat: &dyn ChatClient,
    books: &[(Book, String)],
    keywords: &[String],
    review_context: &str,
) -> Vec<String> {
    let templated: Vec<String> = books.iter().map(|(_, reason)| reason.clone()).collect();
    if books.is_empty() {
        return templated;
    }

    let items: Vec<serde_json::Value> = books
        .iter()
        .map(|(book, reason)| {
            json!({
                "title": book.title.trim(),
                "author": book.author.trim(),
                "reason_draft": reason.trim(),
            })
        })
        .collect();
    let payload = json!({
        "keywords": keywords.iter().take(5).collect::<Vec<_>>(),
        "review_context": review_context,
        "items": items,
    });

    let prompt = format!(
        "Rewrite each reason_draft to be more natural and readable in Korean.\n\
         Return only a JSON array of strings, same length and order as items.\n\
         Do not include code fences, explanations, or extra text.\n\
         Rules:\n\
         - Output exactly one sentence per item (about 60-120 chars).\n\
         - Use a warm and considerate tone.\n\
         - Do not add new facts beyond the provided data.\n\
         - Include at least one keyword from the user's review verbatim in each item.\n\
         - Do not mention title or author.\n\
         - Make each item distinct; do not repeat the same sentence across items.\n\
         DATA:\n{payload}"
    );

    let content = match chat.complete(REFINE_SYSTEM, &prompt, REFINE_TEMPERATURE).await {
        Ok(content) => content,
        Err(e) => {
            warn!("reason refinement: chat request failed: {e}");
            return templated;
        }
    };

    let Some(mut rewrites) = parse_json_array(&content) else {
        warn!("reason refinement: response was not a JSON array");
        return templated;
    };
    rewrites.resize(books.len(), String::new());

    books
        .iter()
        .zip(rewrites)
        .map(|((book, reason), rewrite)| {
            let candidate = rewrite.trim();
            if is_reason_safe(candidate, &book.title, &book.author) && has_keyword(candidate, keywords)
            {
                candidate.to_string()
            } else {
                reason.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, title: &str, author: &str) -> Book {
        Book {
            id,
            isbn: format!("978000000000{id}"),
            title: title.to_string(),
            author: author.to_string(),
            publisher: String::new(),
        }
    }

    fn kw(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn same_author_wins_over_keywords() {
        let source = book(1, "소년이 온다", "한강");
        let candidate = book(2, "채식주의자", "한강 (지은이)");
        let reason = reason_for_book(&candidate, &source, &kw(&["여운"]), 0);
        assert_eq!(reason, SAME_AUTHOR_REASON);
    }

    #[test]
    fn mapped_keyword_produces_the_curated_sentence() {
        let source = book(1, "소년이 온다", "한강");
        let candidate = book(2, "다른 책", "다른 작가");
        let reason = reason_for_book(&candidate, &source, &kw(&["여운"]), 0);
        assert_eq!(reason, "읽고 난 뒤 여운이 오래 남는 책이에요.");
    }

    #[test]
    fn unmapped_keywords_fall_back_to_the_template_with_rotation() {
        let source = book(1, "소년이 온다", "한강");
        let candidate = book(2, "다른 책", "다른 작가");
        let keywords = kw(&["첫째 주제", "둘째 주제"]);
        let first = reason_for_book(&candidate, &source, &keywords, 0);
        let second = reason_for_book(&candidate, &source, &keywords, 1);
        assert!(first.contains("첫째 주제"));
        assert!(second.contains("둘째 주제"));
    }

    #[test]
    fn no_keywords_yields_the_generic_fallback() {
        let source = book(1, "소년이 온다", "한강");
        let candidate = book(2, "다른 책", "다른 작가");
        assert_eq!(reason_for_book(&candidate, &source, &[], 0), GENERIC_REASON);
    }

    #[test]
    fn normalize_author_strips_annotations_and_whitespace() {
        assert_eq!(normalize_author("한강 (지은이)"), "한강");
        assert_eq!(normalize_author("한 강"), "한강");
        assert_eq!(normalize_author(""), "");
    }

    #[test]
    fn unsafe_reasons_are_rejected() {
        assert!(!is_reason_safe("이 책의 제목이 멋져요", "아무 책", "작가"));
        assert!(!is_reason_safe("소년이 온다를 닮았어요", "소년이 온다", "한강"));
        assert!(!is_reason_safe("한강 작가님의 문체", "다른 책", "한강"));
        assert!(!is_reason_safe("", "책", "작가"));
        assert!(is_reason_safe("여운이 오래 남는 책이에요", "소년이 온다", "한강"));
    }

    #[test]
    fn rotate_shifts_by_index() {
        let keywords = kw(&["a", "b", "c"]);
        assert_eq!(rotate(&keywords, 0), kw(&["a", "b", "c"]));
        assert_eq!(rotate(&keywords, 2), kw(&["c", "a", "b"]));
        assert_eq!(rotate(&keywords, 3), kw(&["a", "b", "c"]));
        assert!(rotate(&[], 2).is_empty());
    }
}
