//! Layered keyword extraction for recommendation reasons.
//!
//! Three layers, first non-empty result wins, never merged:
//! 1. curated theme lexicon (pattern match),
//! 2. LLM keyphrase extraction (JSON-array-only contract),
//! 3. frequency heuristic (bigrams weighted over unigrams).

use std::collections::HashSet;

use regex::Regex;
use tracing::warn;

use crate::application::ChatClient;

pub const MAX_KEYWORDS: usize = 5;

/// Context handed to the LLM layer is capped well below the chat budget.
const LLM_CONTEXT_CHARS: usize = 2000;
const LLM_TEMPERATURE: f32 = 0.2;

const LLM_SYSTEM: &str = "You are a helpful assistant.";

/// Curated theme lexicon, checked in order. Patterns are matched against the
/// joined review + neighbor-summary text; each canonical phrase appears at
/// most once.
const LEXICON: &[(&str, &str)] = &[
    (
        r"(역사|역사의|역사적|근현대|현대사|사건|항쟁|민주화|학살|참사|전쟁|분단|독재|군사정권|광주)",
        "역사적 사건",
    ),
    (r"(아픔|상처|비극|슬픔|고통|상흔|트라우마)", "아픔의 기억"),
    (r"(기억|회상|되새김|잊지|추모|기억하는)", "아픔의 기억"),
    (r"(무거운|묵직한|암울한|침울한|음울한|비장한)", "무거운 분위기"),
    (r"(분노|격정|분개|억울함)", "분노"),
    (r"(슬픔|애도|눈물|비애)", "슬픔"),
    (r"(소년|아이|청소년)", "소년"),
    (r"(잔인|폭력|비정)", "잔인함"),
    (r"(여운|잔상|오래 남)", "여운"),
    (r"(기억|추억)", "기억"),
];

/// Stopwords for the frequency layer: particles, fillers, and book-review
/// boilerplate that would otherwise dominate the counts.
const STOPWORDS: &[&str] = &[
    "그리고", "하지만", "그래서", "그런데", "정말", "너무", "조금", "그냥", "이런",
    "저런", "이것", "저것", "그거", "이거", "책", "작품", "이야기", "문장", "내용",
    "느낌", "생각", "사건", "사람", "마음", "독자", "작가", "시선", "부분", "장면",
    "읽다", "읽고", "읽는", "읽었다", "있다", "없다", "하다", "된다", "처럼", "때문",
];

/// Run the layers in order and return the first non-empty result.
pub async fn extract_keywords(
    chat: Option<&dyn ChatClient>,
    texts: &[String],
    max_keywords: usize,
) -> Vec<String> {
    let keywords = lexicon_keywords(texts, max_keywords);
    if !keywords.is_empty() {
        return keywords;
    }

    if let Some(chat) = chat {
        let keywords = llm_keywords(chat, texts, max_keywords).await;
        if !keywords.is_empty() {
            return keywords;
        }
    }

    frequency_keywords(texts, max_keywords)
}

/// Layer 1: canonical theme phrases from the curated lexicon.
pub fn lexicon_keywords(texts: &[String], max_keywords: usize) -> Vec<String> {
    let joined = texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    let mut seen = HashSet::new();
    for (pattern, keyword) in LEXICON {
        if found.len() >= max_keywords {
            break;
        }
        if seen.contains(keyword) {
            continue;
        }
        let matched = Regex::new(pattern)
            .map(|re| re.is_match(&joined))
            .unwrap_or(false);
        if matched {
            found.push((*keyword).to_string());
            seen.insert(*keyword);
        }
    }
    found
}

/// Layer 2: ask the LLM for 3-5 keyphrases, strictly as a JSON array.
pub async fn llm_keywords(
    chat: &dyn ChatClient,
    texts: &[String],
    max_keywords: usize,
) -> Vec<String> {
    let context = context_snippet(texts, LLM_CONTEXT_CHARS);
    if context.is_empty() {
        return Vec::new();
    }

    let prompt = format!(
        "Extract 3-5 concise Korean keyphrases from the text.\n\
         Use only information present in the text.\n\
         Return only a JSON array of strings, no extra text.\n\
         Keyphrases should be 2-6 words and meaningful for recommendation reasons.\n\
         TEXT:\n{context}"
    );

    let content = match chat.complete(LLM_SYSTEM, &prompt, LLM_TEMPERATURE).await {
        Ok(content) => content,
        Err(e) => {
            warn!("keyword extraction: chat request failed: {e}");
            return Vec::new();
        }
    };

    parse_json_array(&content)
        .unwrap_or_default()
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .take(max_keywords)
        .collect()
}

/// Layer 3: frequency heuristic. Bigrams count triple, unigrams count 1.5x,
/// ties broken toward longer terms.
pub fn frequency_keywords(texts: &[String], max_keywords: usize) -> Vec<String> {
    use std::collections::HashMap;

    if texts.is_empty() {
        return Vec::new();
    }

    let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();
    let mut unigram_counts: HashMap<String, usize> = HashMap::new();
    let mut bigram_counts: HashMap<String, usize> = HashMap::new();

    for text in texts {
        let cleaned: String = text
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c) || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        let tokens: Vec<&str> = cleaned
            .split_whitespace()
            .filter(|t| t.chars().count() >= 2 && !stopwords.contains(t))
            .collect();

        for token in &tokens {
            *unigram_counts.entry((*token).to_string()).or_insert(0) += 1;
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            *bigram_counts.entry(bigram).or_insert(0) += 1;
        }
    }

    let mut candidates: Vec<(String, f64)> = Vec::new();
    for (term, count) in bigram_counts {
        candidates.push((term, count as f64 * 3.0));
    }
    for (term, count) in unigram_counts {
        candidates.push((term, count as f64 * 1.5));
    }

    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.0.chars().count().cmp(&a.0.chars().count()))
    });

    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for (term, _score) in candidates {
        if !seen.insert(term.clone()) {
            continue;
        }
        keywords.push(term);
        if keywords.len() >= max_keywords {
            break;
        }
    }
    keywords
}

/// Concatenate texts up to a character budget, whole-text-first.
pub fn context_snippet(texts: &[String], max_chars: usize) -> String {
    let mut buf = Vec::new();
    let mut total = 0;
    for text in texts {
        let t = text.trim();
        if t.is_empty() {
            continue;
        }
        if total >= max_chars {
            break;
        }
        let piece: String = t.chars().take(max_chars - total).collect();
        total += piece.chars().count();
        buf.push(piece);
    }
    buf.join(" ")
}

/// Extract the first JSON array of strings from model output. Any text
/// outside the `[…]` block is ignored to be resilient to minor formatting
/// deviations (prose, code fences).
pub fn parse_json_array(content: &str) -> Option<Vec<String>> {
    if let Ok(parsed) = serde_json::from_str::<Vec<String>>(content) {
        return Some(parsed);
    }

    let start = content.find('[')?;
    let end = content.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Vec<String>>(&content[start..=end]).ok()
}
