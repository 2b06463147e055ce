//! Pairwise answer similarity.
//!
//! Three independent sub-metrics, each bounded in `[0, 1]`, are combined into
//! a single weighted score:
//!
//! | metric      | input                         | weight |
//! |-------------|-------------------------------|--------|
//! | Jaccard     | lower-cased word token sets   | 0.4    |
//! | Levenshtein | raw text, per character       | 0.3    |
//! | Sequence    | LCS of vocabulary subsequence | 0.3    |
//!
//! Every metric is symmetric, so `compare(a, b) == compare(b, a)` exactly.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::SuspicionLevel;
use crate::normalize::{clamp_chars, tokenize, vocabulary_subsequence, DEFAULT_VOCABULARY};

// Weights in tenths so that three perfect scores sum to exactly 1.0.
const JACCARD_TENTHS: f64 = 4.0;
const LEVENSHTEIN_TENTHS: f64 = 3.0;
const SEQUENCE_TENTHS: f64 = 3.0;

/// Similarity between two answer texts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub jaccard: f64,
    pub levenshtein: f64,
    pub sequence_score: f64,
    pub combined_score: f64,
    pub level: SuspicionLevel,
}

impl Similarity {
    fn from_parts(jaccard: f64, levenshtein: f64, sequence_score: f64) -> Self {
        let combined_score = combine(jaccard, levenshtein, sequence_score);
        Self {
            jaccard,
            levenshtein,
            sequence_score,
            combined_score,
            level: SuspicionLevel::from_similarity(combined_score),
        }
    }
}

/// Weighted combination `0.4*j + 0.3*l + 0.3*s`, clamped to `[0, 1]`.
pub fn combine(jaccard: f64, levenshtein: f64, sequence_score: f64) -> f64 {
    let weighted =
        JACCARD_TENTHS * jaccard + LEVENSHTEIN_TENTHS * levenshtein + SEQUENCE_TENTHS * sequence_score;
    (weighted / 10.0).clamp(0.0, 1.0)
}

/// Jaccard index over the token sets of two texts.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<String> = tokenize(a).into_iter().collect();
    let tokens_b: HashSet<String> = tokenize(b).into_iter().collect();

    match (tokens_a.is_empty(), tokens_b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.len() + tokens_b.len() - intersection;
    intersection as f64 / union as f64
}

/// Classic edit distance over Unicode scalar values.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j]
            } else {
                1 + prev[j].min(prev[j + 1]).min(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Edit distance normalized to `(max_len - distance) / max_len`.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();

    match (len_a, len_b) {
        (0, 0) => return 1.0,
        (0, _) | (_, 0) => return 0.0,
        _ => {}
    }

    let max_len = len_a.max(len_b);
    let distance = levenshtein_distance(a, b);
    (max_len - distance) as f64 / max_len as f64
}

/// Length of the longest common subsequence of two slices.
pub fn lcs_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for item_a in a {
        for (j, item_b) in b.iter().enumerate() {
            curr[j + 1] = if item_a == item_b {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// LCS of the two vocabulary subsequences over the longer one's length.
pub fn sequence_similarity<S: AsRef<str>>(a: &str, b: &str, vocabulary: &[S]) -> f64 {
    let seq_a = vocabulary_subsequence(a, vocabulary);
    let seq_b = vocabulary_subsequence(b, vocabulary);

    let max_len = seq_a.len().max(seq_b.len());
    if max_len == 0 {
        return 1.0;
    }
    lcs_len(&seq_a, &seq_b) as f64 / max_len as f64
}

/// Computes [`Similarity`] with an injected keyword vocabulary and an
/// optional cap on the number of characters compared per text.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    vocabulary: Vec<String>,
    max_text_chars: Option<usize>,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self {
            vocabulary: DEFAULT_VOCABULARY.iter().map(|s| s.to_string()).collect(),
            max_text_chars: None,
        }
    }
}

impl SimilarityEngine {
    /// Terms are trimmed and upper-cased; blank terms are dropped.
    pub fn new(vocabulary: Vec<String>) -> Self {
        Self {
            vocabulary: vocabulary
                .iter()
                .map(|term| term.trim().to_uppercase())
                .filter(|term| !term.is_empty())
                .collect(),
            max_text_chars: None,
        }
    }

    /// Compare only the first `max_chars` characters of each text.
    pub fn with_max_text_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_text_chars = max_chars;
        self
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn max_text_chars(&self) -> Option<usize> {
        self.max_text_chars
    }

    /// Compute all three sub-metrics and their weighted combination.
    pub fn compare(&self, a: &str, b: &str) -> Similarity {
        let (a, b) = match self.max_text_chars {
            Some(max) => (clamp_chars(a, max), clamp_chars(b, max)),
            None => (a, b),
        };

        Similarity::from_parts(
            jaccard_similarity(a, b),
            levenshtein_similarity(a, b),
            sequence_similarity(a, b, &self.vocabulary),
        )
    }
}

/// Compare two answer texts with the default SQL vocabulary and no length cap.
pub fn pair_similarity(a: &str, b: &str) -> Similarity {
    SimilarityEngine::default().compare(a, b)
}
