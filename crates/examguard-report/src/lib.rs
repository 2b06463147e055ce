//! examguard-report: HTML and CSV renderings of a cohort run.

pub mod csv;
pub mod highlight;
pub mod html;

pub use csv::{generate_csv, write_csv_report};
pub use highlight::highlight_evidence;
pub use html::{generate_html, write_html_report};

/// Escape a string for safe HTML insertion.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Utc;
    use examguard_core::config::AnalysisConfig;
    use examguard_core::model::{Answer, ExamAnswer};
    use examguard_core::report::{build_report, CohortRun};
    use examguard_core::{analyze_exam, detect_collusion};

    const SHARED: &str = "SELECT p.name FROM Pilots p JOIN Squadrons s ON p.squadron_id = s.squadron_id";
    const PLANTED: &str = "SELECT m.duration_minutes FROM MissionAnalytics m JOIN MissionAnalytics x ON m.id = x.id";

    fn answer(id: &str, name: &str, question_index: u32, question: &str, text: &str) -> Answer {
        Answer {
            student_id: Some(id.into()),
            student_name: Some(name.into()),
            student_email: Some(format!("{id}@uni.edu")),
            question_index,
            question_text: question.into(),
            answer_text: text.into(),
            exam_id: "exam-1".into(),
        }
    }

    pub(crate) fn make_test_answers() -> Vec<Answer> {
        vec![
            answer("alice", "Alice", 0, "List pilots", SHARED),
            answer("alice", "Alice", 1, "Mission report", PLANTED),
            answer("carol", "Carol", 0, "List pilots", SHARED),
        ]
    }

    pub(crate) fn make_test_run() -> CohortRun {
        let alice = analyze_exam(
            "alice",
            &[ExamAnswer::new(0, SHARED), ExamAnswer::new(1, PLANTED)],
            30,
        );
        let carol = analyze_exam("carol", &[ExamAnswer::new(0, SHARED)], 30);
        let pairs = detect_collusion(0, &[("alice", SHARED), ("carol", SHARED)], 0.8);

        CohortRun {
            id: uuid::Uuid::nil(),
            created_at: Utc::now(),
            duration_ms: 5,
            config: AnalysisConfig::default(),
            total_answers: 3,
            total_comparisons: 1,
            partial: false,
            failed_tasks: 0,
            report: build_report(vec![carol, alice], pairs),
        }
    }
}
