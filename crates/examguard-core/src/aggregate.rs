//! Exam-level roll-up of per-answer trap scores.

use serde::{Deserialize, Serialize};

use crate::model::{ExamAnswer, SuspicionLevel};
use crate::traps::{TrapEvidence, TrapScorer};

/// Default per-answer score at which an answer counts toward the exam verdict.
pub const DEFAULT_AI_THRESHOLD: u32 = 30;

/// An exam is suspicious when at least this many answers cross the threshold...
pub const SUSPICIOUS_ANSWER_COUNT: usize = 2;
/// ...or any single answer reaches this score...
pub const SUSPICIOUS_MAX_SCORE: u32 = 50;
/// ...or the mean score reaches this value.
pub const SUSPICIOUS_AVG_SCORE: f64 = 30.0;

/// Evidence for one answer that crossed the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerDetail {
    pub question_index: u32,
    pub answer_text: String,
    pub score: u32,
    pub summary: String,
    pub evidence: Vec<TrapEvidence>,
}

/// Verdict for one student's exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSuspicionSummary {
    pub student_id: String,
    pub total_questions: usize,
    pub suspicious_answer_count: usize,
    pub max_score: u32,
    pub avg_score: f64,
    /// Bucket of `max_score`.
    pub level: SuspicionLevel,
    pub exam_suspicious: bool,
    /// Items whose text could not be read; scored as empty.
    #[serde(default)]
    pub unreadable_answers: usize,
    /// Only answers at or above the threshold.
    pub details: Vec<AnswerDetail>,
}

/// Runs a [`TrapScorer`] over a student's answers and rolls up the result.
#[derive(Debug, Clone, Copy)]
pub struct ExamAggregator<'a> {
    scorer: &'a TrapScorer,
    ai_threshold: u32,
}

impl<'a> ExamAggregator<'a> {
    pub fn new(scorer: &'a TrapScorer, ai_threshold: u32) -> Self {
        Self {
            scorer,
            ai_threshold,
        }
    }

    pub fn analyze(&self, student_id: &str, answers: &[ExamAnswer]) -> ExamSuspicionSummary {
        let mut scores = Vec::with_capacity(answers.len());
        let mut details = Vec::new();
        let mut unreadable_answers = 0usize;

        for answer in answers {
            let text = match answer.answer_text.as_deref() {
                Some(text) => text,
                None => {
                    tracing::warn!(
                        "student {student_id}: answer to question {} is unreadable, scoring as empty",
                        answer.question_index
                    );
                    unreadable_answers += 1;
                    ""
                }
            };

            let result = self.scorer.score(text);
            scores.push(result.score);

            if result.score >= self.ai_threshold {
                details.push(AnswerDetail {
                    question_index: answer.question_index,
                    answer_text: text.to_string(),
                    score: result.score,
                    summary: result.summary,
                    evidence: result.evidence,
                });
            }
        }

        let suspicious_answer_count = scores.iter().filter(|&&s| s >= self.ai_threshold).count();
        let max_score = scores.iter().copied().max().unwrap_or(0);
        let avg_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
        };

        let exam_suspicious = suspicious_answer_count >= SUSPICIOUS_ANSWER_COUNT
            || max_score >= SUSPICIOUS_MAX_SCORE
            || avg_score >= SUSPICIOUS_AVG_SCORE;

        ExamSuspicionSummary {
            student_id: student_id.to_string(),
            total_questions: answers.len(),
            suspicious_answer_count,
            max_score,
            avg_score,
            level: SuspicionLevel::from_suspicion_score(max_score),
            exam_suspicious,
            unreadable_answers,
            details,
        }
    }
}

/// Analyze one exam against the built-in rule table.
pub fn analyze_exam(
    student_id: &str,
    answers: &[ExamAnswer],
    ai_threshold: u32,
) -> ExamSuspicionSummary {
    let scorer = TrapScorer::with_default_rules();
    ExamAggregator::new(&scorer, ai_threshold).analyze(student_id, answers)
}
