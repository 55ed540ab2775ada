//! Text normalization shared by every component that talks to an external
//! text API.

use sha2::{Digest, Sha256};

/// Upper bound applied before any text leaves the process. Counted in
/// characters, not bytes: most of the corpus is Hangul.
pub const MAX_CLEAN_CHARS: usize = 1500;

/// Collapse runs of whitespace to single spaces, trim, and truncate to
/// [`MAX_CLEAN_CHARS`]. Empty input yields an empty string; never fails.
pub fn clean(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_CLEAN_CHARS).collect()
}

/// Stable content hash used as the embedding-cache key: SHA-256 hex digest
/// truncated to 16 characters.
pub fn stable_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_whitespace_and_trims() {
        assert_eq!(clean("  a\t\tb \n c  "), "a b c");
    }

    #[test]
    fn clean_handles_empty_input() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   \n\t "), "");
    }

    #[test]
    fn clean_truncates_by_characters_not_bytes() {
        let long: String = "가".repeat(MAX_CLEAN_CHARS + 100);
        let cleaned = clean(&long);
        assert_eq!(cleaned.chars().count(), MAX_CLEAN_CHARS);
    }

    #[test]
    fn stable_hash_is_deterministic_and_short() {
        let a = stable_hash("잊지 못할 이야기");
        let b = stable_hash("잊지 못할 이야기");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(a, stable_hash("다른 이야기"));
    }
}
