//! End-to-end pipeline tests through the library crates.
//!
//! These tests drive a cohort through the analyzer (score, aggregate, scan,
//! report) and then render every output format from the same run.

use examguard_core::config::AnalysisConfig;
use examguard_core::engine::{CohortAnalyzer, NoopReporter};
use examguard_core::model::{Answer, SuspicionLevel};
use examguard_core::parser::parse_answers_str;
use examguard_core::report::CohortRun;
use examguard_report::{generate_csv, generate_html};

const SHARED: &str =
    "SELECT p.name, s.name FROM Pilots p JOIN Squadrons s ON p.squadron_id = s.squadron_id";

fn cohort() -> Vec<Answer> {
    let json = format!(
        r#"[
  {{"student_id": "s1", "question_index": 0, "answer_text": "{SHARED}"}},
  {{"student_id": "s2", "question_index": 0, "answer_text": "{SHARED}"}},
  {{"student_id": "s3", "question_index": 0, "answer_text": "SELECT COUNT(*) FROM Missions GROUP BY status"}},
  {{"student_id": "s1", "question_index": 1, "answer_text": "SELECT * FROM MissionAnalytics ORDER BY fuel_consumption"}},
  {{"student_id": "s2", "question_index": 1, "answer_text": "short"}},
  {{"student_id": "s3", "question_index": 1, "answer_text": "SELECT name FROM Aircraft WHERE status = 'active'"}}
]"#
    );
    parse_answers_str(&json, std::path::Path::new("cohort.json")).unwrap()
}

async fn run(config: AnalysisConfig) -> CohortRun {
    CohortAnalyzer::from_config(config)
        .unwrap()
        .run(&cohort(), &NoopReporter)
        .await
        .unwrap()
}

// --- Full pipeline ---

#[tokio::test]
async fn cohort_pipeline_finds_copy_and_planted_answer() {
    let run = run(AnalysisConfig::default()).await;

    // "short" falls under the minimum length
    assert_eq!(run.total_answers, 5);
    assert!(!run.partial);
    assert_eq!(run.failed_tasks, 0);

    let report = &run.report;
    assert_eq!(report.total_students, 3);
    assert_eq!(report.collusion_pair_count, 1);
    assert_eq!(report.high_risk_pairs, 1);

    let pair = &report.collusion_pairs[0];
    assert_eq!((pair.student_a.as_str(), pair.student_b.as_str()), ("s1", "s2"));
    assert_eq!(pair.combined_score, 1.0);
    assert_eq!(pair.level, SuspicionLevel::High);

    let top = &report.exam_summaries[0];
    assert_eq!(top.student_id, "s1");
    assert!(top.exam_suspicious);
    assert_eq!(report.suspicious_ai_count, 1);
}

#[tokio::test]
async fn pipeline_is_deterministic_across_parallelism() {
    let serial = run(AnalysisConfig {
        parallelism: 1,
        ..AnalysisConfig::default()
    })
    .await;
    let wide = run(AnalysisConfig {
        parallelism: 8,
        ..AnalysisConfig::default()
    })
    .await;
    assert_eq!(serial.report, wide.report);
    assert_eq!(serial.total_comparisons, wide.total_comparisons);
}

#[tokio::test]
async fn zero_threshold_reports_every_pair() {
    let run = run(AnalysisConfig {
        similarity_threshold: 0.0,
        ..AnalysisConfig::default()
    })
    .await;
    // q0: 3 students, q1: 2 students after filtering
    assert_eq!(run.total_comparisons, 4);
    assert_eq!(run.report.collusion_pair_count, 4);
}

// --- Rendering ---

#[tokio::test]
async fn every_format_renders_from_one_run() {
    let answers = cohort();
    let run = run(AnalysisConfig::default()).await;

    let html = generate_html(&run);
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("s1"));
    assert!(html.contains("ai-trap-high"));

    let csv = generate_csv(&run, &answers);
    assert!(csv.starts_with("Statistic,Value\n"));
    assert!(csv.contains("s1"));

    let md = run.to_markdown();
    assert!(md.contains("Collusion pairs"));
    assert!(md.contains("| 0 | s1 | s2 | 100.0% | high |"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    run.save_json(&path).unwrap();
    let loaded = CohortRun::load_json(&path).unwrap();
    assert_eq!(loaded.report, run.report);
}
