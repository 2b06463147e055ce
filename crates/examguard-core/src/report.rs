//! Cohort report assembly with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::ExamSuspicionSummary;
use crate::collusion::PairSimilarity;
use crate::config::AnalysisConfig;
use crate::model::SuspicionLevel;

/// Aggregated findings for a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub total_students: usize,
    /// Exams flagged `exam_suspicious`.
    pub suspicious_ai_count: usize,
    pub collusion_pair_count: usize,
    /// Mean combined score over reported pairs, 0 when there are none.
    pub average_similarity_score: f64,
    /// Pairs at the `high` level.
    pub high_risk_pairs: usize,
    /// Sorted by `max_score` descending, then student id.
    pub exam_summaries: Vec<ExamSuspicionSummary>,
    /// In detector order.
    pub collusion_pairs: Vec<PairSimilarity>,
}

/// Combine exam verdicts and collusion pairs into a cohort report.
pub fn build_report(
    mut exam_summaries: Vec<ExamSuspicionSummary>,
    collusion_pairs: Vec<PairSimilarity>,
) -> Report {
    exam_summaries.sort_by(|a, b| {
        b.max_score
            .cmp(&a.max_score)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });

    let suspicious_ai_count = exam_summaries.iter().filter(|s| s.exam_suspicious).count();
    let high_risk_pairs = collusion_pairs
        .iter()
        .filter(|p| p.level == SuspicionLevel::High)
        .count();
    let average_similarity_score = if collusion_pairs.is_empty() {
        0.0
    } else {
        collusion_pairs.iter().map(|p| p.combined_score).sum::<f64>()
            / collusion_pairs.len() as f64
    };

    Report {
        total_students: exam_summaries.len(),
        suspicious_ai_count,
        collusion_pair_count: collusion_pairs.len(),
        average_similarity_score,
        high_risk_pairs,
        exam_summaries,
        collusion_pairs,
    }
}

/// One analysis run over a cohort, as persisted to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortRun {
    /// Unique run identifier.
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Settings the run was made with.
    pub config: AnalysisConfig,
    /// Answers considered after length filtering.
    pub total_answers: usize,
    /// Pairwise comparisons actually performed.
    pub total_comparisons: usize,
    /// `true` when the comparison budget left some pairs unexamined.
    pub partial: bool,
    /// Analysis tasks that failed and were recorded as empty.
    #[serde(default)]
    pub failed_tasks: usize,
    pub report: Report,
}

impl CohortRun {
    /// Save the run as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize cohort run")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a run from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let run: CohortRun =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(run)
    }

    /// Format the run as markdown.
    pub fn to_markdown(&self) -> String {
        let report = &self.report;
        let mut md = String::new();

        md.push_str("# Exam integrity report\n\n");
        md.push_str(&format!(
            "Run `{}` at {}, {} answers, {} comparisons in {} ms.\n\n",
            self.id,
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.total_answers,
            self.total_comparisons,
            self.duration_ms
        ));
        if self.partial {
            md.push_str(
                "> **Partial results:** the comparison budget was reached before every pair was compared.\n\n",
            );
        }
        if self.failed_tasks > 0 {
            md.push_str(&format!(
                "> **Warning:** {} analysis task(s) failed and are missing from this report.\n\n",
                self.failed_tasks
            ));
        }

        md.push_str(&format!(
            "**Summary:** {} students, {} suspicious exams, {} collusion pairs ({} high risk), average similarity {:.1}%\n\n",
            report.total_students,
            report.suspicious_ai_count,
            report.collusion_pair_count,
            report.high_risk_pairs,
            report.average_similarity_score * 100.0
        ));

        let flagged: Vec<_> = report
            .exam_summaries
            .iter()
            .filter(|s| s.exam_suspicious)
            .collect();
        if !flagged.is_empty() {
            md.push_str("### Suspicious exams\n\n");
            md.push_str("| Student | Level | Max | Avg | Flagged answers |\n");
            md.push_str("|---------|-------|-----|-----|-----------------|\n");
            for s in flagged {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1} | {}/{} |\n",
                    s.student_id,
                    s.level,
                    s.max_score,
                    s.avg_score,
                    s.suspicious_answer_count,
                    s.total_questions
                ));
            }
            md.push('\n');
        }

        if !report.collusion_pairs.is_empty() {
            md.push_str("### Collusion pairs\n\n");
            md.push_str("| Question | Student A | Student B | Combined | Level |\n");
            md.push_str("|----------|-----------|-----------|----------|-------|\n");
            for p in &report.collusion_pairs {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% | {} |\n",
                    p.question_index,
                    p.student_a,
                    p.student_b,
                    p.combined_score * 100.0,
                    p.level
                ));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(student_id: &str, max_score: u32, exam_suspicious: bool) -> ExamSuspicionSummary {
        ExamSuspicionSummary {
            student_id: student_id.into(),
            total_questions: 3,
            suspicious_answer_count: usize::from(exam_suspicious),
            max_score,
            avg_score: f64::from(max_score) / 3.0,
            level: SuspicionLevel::from_suspicion_score(max_score),
            exam_suspicious,
            unreadable_answers: 0,
            details: vec![],
        }
    }

    fn pair(a: &str, b: &str, combined_score: f64) -> PairSimilarity {
        PairSimilarity {
            student_a: a.into(),
            student_b: b.into(),
            question_index: 0,
            jaccard: combined_score,
            levenshtein: combined_score,
            sequence_score: combined_score,
            combined_score,
            level: SuspicionLevel::from_similarity(combined_score),
        }
    }

    fn make_run(report: Report) -> CohortRun {
        CohortRun {
            id: Uuid::nil(),
            created_at: Utc::now(),
            duration_ms: 12,
            config: AnalysisConfig::default(),
            total_answers: 6,
            total_comparisons: 3,
            partial: false,
            failed_tasks: 0,
            report,
        }
    }

    #[test]
    fn empty_report_has_zero_counts() {
        let report = build_report(vec![], vec![]);
        assert_eq!(report.total_students, 0);
        assert_eq!(report.suspicious_ai_count, 0);
        assert_eq!(report.collusion_pair_count, 0);
        assert_eq!(report.average_similarity_score, 0.0);
        assert_eq!(report.high_risk_pairs, 0);
    }

    #[test]
    fn counts_and_averages() {
        let report = build_report(
            vec![summary("s1", 55, true), summary("s2", 10, false), summary("s3", 60, true)],
            vec![pair("s1", "s2", 1.0), pair("s2", "s3", 0.8)],
        );
        assert_eq!(report.total_students, 3);
        assert_eq!(report.suspicious_ai_count, 2);
        assert_eq!(report.collusion_pair_count, 2);
        assert_eq!(report.high_risk_pairs, 1);
        assert!((report.average_similarity_score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn summaries_sorted_by_max_score_then_id() {
        let report = build_report(
            vec![summary("b", 40, false), summary("c", 70, true), summary("a", 40, false)],
            vec![],
        );
        let ids: Vec<_> = report.exam_summaries.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn pair_order_is_preserved() {
        let pairs = vec![pair("x", "y", 0.9), pair("a", "b", 0.95)];
        let report = build_report(vec![], pairs.clone());
        assert_eq!(report.collusion_pairs, pairs);
    }

    #[test]
    fn json_roundtrip() {
        let run = make_run(build_report(vec![summary("s1", 55, true)], vec![pair("s1", "s2", 1.0)]));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run.json");

        run.save_json(&path).unwrap();
        let loaded = CohortRun::load_json(&path).unwrap();

        assert_eq!(loaded.id, Uuid::nil());
        assert_eq!(loaded.report, run.report);
        assert_eq!(loaded.config.similarity_threshold, run.config.similarity_threshold);
    }

    #[test]
    fn load_missing_file_fails_with_path() {
        let err = CohortRun::load_json(Path::new("/nonexistent/run.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/run.json"));
    }

    #[test]
    fn markdown_output() {
        let mut run = make_run(build_report(
            vec![summary("s1", 55, true), summary("s2", 5, false)],
            vec![pair("s1", "s2", 1.0)],
        ));
        run.partial = true;
        let md = run.to_markdown();
        assert!(md.contains("Suspicious exams"));
        assert!(md.contains("| s1 | medium | 55 |"));
        assert!(!md.contains("| s2 | low"));
        assert!(md.contains("Collusion pairs"));
        assert!(md.contains("100.0%"));
        assert!(md.contains("Partial results"));
    }
}
