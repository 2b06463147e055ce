//! Answer text normalization.
//!
//! Produces the token and keyword-sequence forms consumed by the similarity
//! metrics. Every function here is total over arbitrary input.

/// Canonical SQL keyword vocabulary, in canonical order.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "SELECT", "FROM", "WHERE", "JOIN", "GROUP BY", "HAVING", "ORDER BY", "INSERT", "UPDATE",
    "DELETE",
];

/// Tokens of this many characters or fewer are discarded.
const MIN_TOKEN_CHARS: usize = 2;

/// Split text into lower-cased word tokens for the Jaccard metric.
///
/// Anything outside `[A-Za-z0-9_]` and whitespace becomes a separator, so
/// non-Latin prose around a query is dropped. Tokens of two characters or
/// fewer are dropped too. Token order follows the text.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Return the vocabulary terms present anywhere in `text`, in vocabulary order.
///
/// Presence is tested against the upper-cased text. The result reflects the
/// order of `vocabulary`, not the order in which terms occur in `text`.
pub fn vocabulary_subsequence<S: AsRef<str>>(text: &str, vocabulary: &[S]) -> Vec<String> {
    let upper = text.to_uppercase();
    vocabulary
        .iter()
        .map(|term| term.as_ref())
        .filter(|term| !term.is_empty() && upper.contains(term))
        .map(str::to_string)
        .collect()
}

/// Truncate `text` to at most `max_chars` characters.
pub fn clamp_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_strips_punctuation_and_short_tokens() {
        let tokens = tokenize("SELECT p.name, s.id FROM Pilots p;");
        assert_eq!(tokens, vec!["select", "name", "from", "pilots"]);
    }

    #[test]
    fn tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  alpha \n\t beta   "), vec!["alpha", "beta"]);
    }

    #[test]
    fn tokenize_drops_non_ascii_words() {
        let tokens = tokenize("השאילתה בוחרת SELECT name FROM pilots");
        assert_eq!(tokens, vec!["select", "name", "from", "pilots"]);
        assert_eq!(tokenize("café total"), vec!["caf", "total"]);
    }

    #[test]
    fn tokenize_empty_and_symbol_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("!!! ... ,,,").is_empty());
    }

    #[test]
    fn tokenize_keeps_underscored_identifiers() {
        assert_eq!(tokenize("weapon_id=5"), vec!["weapon_id"]);
    }

    #[test]
    fn vocabulary_order_not_text_order() {
        let seq = vocabulary_subsequence("from pilots select name where id = 1", DEFAULT_VOCABULARY);
        assert_eq!(seq, vec!["SELECT", "FROM", "WHERE"]);
    }

    #[test]
    fn vocabulary_multiword_terms() {
        let seq = vocabulary_subsequence(
            "select squadron, count(*) from pilots group by squadron order by 2",
            DEFAULT_VOCABULARY,
        );
        assert_eq!(seq, vec!["SELECT", "FROM", "GROUP BY", "ORDER BY"]);
    }

    #[test]
    fn vocabulary_empty_text() {
        assert!(vocabulary_subsequence("", DEFAULT_VOCABULARY).is_empty());
    }

    #[test]
    fn clamp_respects_char_boundaries() {
        assert_eq!(clamp_chars("héllo", 2), "hé");
        assert_eq!(clamp_chars("abc", 10), "abc");
        assert_eq!(clamp_chars("abc", 0), "");
    }
}
