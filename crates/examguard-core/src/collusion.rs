//! Pairwise collusion scanning over one question's answers.
//!
//! Students are compared in sorted-id order so that both the emitted pairs and
//! any budget truncation are deterministic.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::SuspicionLevel;
use crate::similarity::SimilarityEngine;

/// Default combined score at which a pair is reported.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// A reported pair of similar answers. `student_a < student_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSimilarity {
    pub student_a: String,
    pub student_b: String,
    pub question_index: u32,
    pub jaccard: f64,
    pub levenshtein: f64,
    pub sequence_score: f64,
    pub combined_score: f64,
    pub level: SuspicionLevel,
}

/// Result of scanning one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollusionScan {
    pub question_index: u32,
    /// Distinct students after de-duplication.
    pub students: usize,
    /// Pairs actually compared.
    pub comparisons: usize,
    /// `true` when the pair budget stopped the scan early.
    pub truncated: bool,
    pub pairs: Vec<PairSimilarity>,
}

impl CollusionScan {
    pub fn empty(question_index: u32) -> Self {
        Self {
            question_index,
            students: 0,
            comparisons: 0,
            truncated: false,
            pairs: Vec::new(),
        }
    }
}

/// Number of unordered pairs among `n` students.
pub fn pair_count(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1)) / 2
}

/// Descending combined score, ties broken by student ids then question.
pub fn compare_pairs(a: &PairSimilarity, b: &PairSimilarity) -> Ordering {
    b.combined_score
        .total_cmp(&a.combined_score)
        .then_with(|| a.student_a.cmp(&b.student_a))
        .then_with(|| a.student_b.cmp(&b.student_b))
        .then_with(|| a.question_index.cmp(&b.question_index))
}

/// Put pairs into report order.
pub fn sort_pairs(pairs: &mut [PairSimilarity]) {
    pairs.sort_by(compare_pairs);
}

/// Compares every pair of distinct students who answered a question.
#[derive(Debug, Clone, Copy)]
pub struct CollusionDetector<'a> {
    engine: &'a SimilarityEngine,
    threshold: f64,
    max_pairs: Option<usize>,
}

impl<'a> CollusionDetector<'a> {
    pub fn new(engine: &'a SimilarityEngine, threshold: f64) -> Self {
        Self {
            engine,
            threshold,
            max_pairs: None,
        }
    }

    /// Stop after comparing this many pairs.
    pub fn with_max_pairs(mut self, max_pairs: Option<usize>) -> Self {
        self.max_pairs = max_pairs;
        self
    }

    /// Scan one question. `answers` holds `(student_id, answer_text)`; a
    /// student's first answer wins when they appear more than once.
    pub fn scan<I, T>(&self, question_index: u32, answers: &[(I, T)]) -> CollusionScan
    where
        I: AsRef<str>,
        T: AsRef<str>,
    {
        let mut by_student: BTreeMap<&str, &str> = BTreeMap::new();
        for (student, text) in answers {
            by_student.entry(student.as_ref()).or_insert(text.as_ref());
        }
        let students: Vec<(&str, &str)> = by_student.into_iter().collect();

        let budget = self.max_pairs.unwrap_or(usize::MAX);
        let total_pairs = pair_count(students.len());
        let mut comparisons = 0usize;
        let mut pairs = Vec::new();

        'outer: for (i, &(student_a, text_a)) in students.iter().enumerate() {
            for &(student_b, text_b) in &students[i + 1..] {
                if comparisons >= budget {
                    break 'outer;
                }
                comparisons += 1;

                let sim = self.engine.compare(text_a, text_b);
                if sim.combined_score >= self.threshold {
                    pairs.push(PairSimilarity {
                        student_a: student_a.to_string(),
                        student_b: student_b.to_string(),
                        question_index,
                        jaccard: sim.jaccard,
                        levenshtein: sim.levenshtein,
                        sequence_score: sim.sequence_score,
                        combined_score: sim.combined_score,
                        level: sim.level,
                    });
                }
            }
        }

        let truncated = comparisons < total_pairs;
        if truncated {
            tracing::warn!(
                "question {question_index}: pair budget reached after {comparisons} of {total_pairs} comparisons"
            );
        }

        sort_pairs(&mut pairs);

        CollusionScan {
            question_index,
            students: students.len(),
            comparisons,
            truncated,
            pairs,
        }
    }
}

/// Report pairs of one question's answers at or above `similarity_threshold`,
/// using the default similarity engine and no pair budget.
pub fn detect_collusion<I, T>(
    question_index: u32,
    answers: &[(I, T)],
    similarity_threshold: f64,
) -> Vec<PairSimilarity>
where
    I: AsRef<str>,
    T: AsRef<str>,
{
    let engine = SimilarityEngine::default();
    CollusionDetector::new(&engine, similarity_threshold)
        .scan(question_index, answers)
        .pairs
}
