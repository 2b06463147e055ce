//! Core data model types for examguard.
//!
//! These are the input records and shared vocabulary types that the scoring,
//! similarity, and collusion modules operate on.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single student's answer to one exam question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Student identifier. Falls back to `student_email` when absent.
    #[serde(default, alias = "studentId")]
    pub student_id: Option<String>,
    /// Optional display name.
    #[serde(default, alias = "studentName")]
    pub student_name: Option<String>,
    /// Optional email address.
    #[serde(default, alias = "studentEmail")]
    pub student_email: Option<String>,
    /// Zero-based question position within the exam.
    #[serde(alias = "questionIndex")]
    pub question_index: u32,
    /// The question prompt as shown to the student.
    #[serde(default, alias = "questionText")]
    pub question_text: String,
    /// The submitted answer. `null` is read as an empty answer.
    #[serde(
        default,
        alias = "answerText",
        alias = "studentAnswer",
        deserialize_with = "null_as_empty"
    )]
    pub answer_text: String,
    /// Exam session identifier.
    #[serde(default, alias = "examId")]
    pub exam_id: String,
}

impl Answer {
    /// The key used to group answers by student.
    pub fn student_key(&self) -> &str {
        self.student_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| {
                self.student_email
                    .as_deref()
                    .filter(|email| !email.trim().is_empty())
            })
            .unwrap_or("unknown")
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One item of a single student's exam, as fed to the exam aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamAnswer {
    pub question_index: u32,
    /// `None` marks an item whose text could not be recovered.
    #[serde(default)]
    pub answer_text: Option<String>,
}

impl ExamAnswer {
    pub fn new(question_index: u32, answer_text: impl Into<String>) -> Self {
        Self {
            question_index,
            answer_text: Some(answer_text.into()),
        }
    }
}

/// Severity of a trap rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" | "med" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Coarse review bucket for a similarity pair or an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspicionLevel {
    Low,
    Medium,
    High,
}

impl SuspicionLevel {
    /// Bucket a combined similarity score in `[0, 1]`.
    pub fn from_similarity(score: f64) -> Self {
        if score >= 0.85 {
            SuspicionLevel::High
        } else if score >= 0.7 {
            SuspicionLevel::Medium
        } else {
            SuspicionLevel::Low
        }
    }

    /// Bucket a trap suspicion score in `[0, 100]`.
    pub fn from_suspicion_score(score: u32) -> Self {
        if score >= 70 {
            SuspicionLevel::High
        } else if score >= 40 {
            SuspicionLevel::Medium
        } else {
            SuspicionLevel::Low
        }
    }
}

impl fmt::Display for SuspicionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuspicionLevel::Low => write!(f, "low"),
            SuspicionLevel::Medium => write!(f, "medium"),
            SuspicionLevel::High => write!(f, "high"),
        }
    }
}

/// A weighted detection rule. Static configuration data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Unique rule identifier (e.g. "mission_analytics_table").
    pub name: String,
    /// Human-readable explanation shown alongside evidence.
    #[serde(default)]
    pub description: String,
    /// Regular expression source. Matched case-insensitively.
    pub pattern: String,
    pub severity: Severity,
    /// Base points added per unique match, up to three matches.
    pub points: u32,
}

impl PatternRule {
    pub fn new(
        name: &str,
        description: &str,
        pattern: &str,
        severity: Severity,
        points: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            pattern: pattern.to_string(),
            severity,
            points,
        }
    }
}
