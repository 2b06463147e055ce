//! The `examguard analyze` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use examguard_core::aggregate::ExamSuspicionSummary;
use examguard_core::collusion::CollusionScan;
use examguard_core::config::load_config_from;
use examguard_core::engine::{CohortAnalyzer, ProgressReporter};
use examguard_core::parser::load_answers;
use examguard_core::report::CohortRun;
use examguard_report::csv::write_csv_report;
use examguard_report::html::write_html_report;

const KNOWN_FORMATS: &[&str] = &["json", "html", "csv", "md"];

pub struct AnalyzeArgs {
    pub answers: PathBuf,
    pub config: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub similarity_threshold: Option<f64>,
    pub ai_threshold: Option<u32>,
    pub parallelism: Option<usize>,
    pub output: PathBuf,
    pub format: String,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_run_start(&self, questions: usize, students: usize) {
        eprintln!("  Analyzing {students} students across {questions} questions");
    }

    fn on_scan_complete(&self, scan: &CollusionScan) {
        let truncated = if scan.truncated { " (budget reached)" } else { "" };
        eprintln!(
            "  Question {}: {} comparisons, {} pair(s){truncated}",
            scan.question_index + 1,
            scan.comparisons,
            scan.pairs.len()
        );
    }

    fn on_exam_complete(&self, summary: &ExamSuspicionSummary) {
        if summary.exam_suspicious {
            eprintln!(
                "  Flagged: {} (max {}, avg {:.1})",
                summary.student_id, summary.max_score, summary.avg_score
            );
        }
    }

    fn on_task_error(&self, task: &str, error: &str) {
        eprintln!("  ERROR: {task}: {error}");
    }

    fn on_run_complete(&self, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed} task(s) succeeded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

fn parse_formats(format: &str) -> Result<Vec<&str>> {
    if format == "all" {
        return Ok(vec!["json", "html", "csv"]);
    }
    let formats: Vec<&str> = format
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    anyhow::ensure!(!formats.is_empty(), "at least one output format is required");
    for f in &formats {
        anyhow::ensure!(
            KNOWN_FORMATS.contains(f),
            "unknown format '{f}', expected one of: json, html, csv, md, all"
        );
    }
    Ok(formats)
}

pub async fn execute(args: AnalyzeArgs) -> Result<()> {
    let formats = parse_formats(&args.format)?;

    // Load config, then apply command-line overrides
    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(threshold) = args.similarity_threshold {
        config.similarity_threshold = threshold;
    }
    if let Some(threshold) = args.ai_threshold {
        config.ai_threshold = threshold;
    }
    if let Some(parallelism) = args.parallelism {
        config.parallelism = parallelism;
    }
    if let Some(rules) = args.rules {
        config.rules_path = Some(rules);
    }

    let analyzer = CohortAnalyzer::from_config(config)?;
    let answers = load_answers(&args.answers)?;

    eprintln!(
        "examguard v{}: analyzing {} answers from {}",
        env!("CARGO_PKG_VERSION"),
        answers.len(),
        args.answers.display()
    );
    eprintln!();

    let run = analyzer.run(&answers, &ConsoleReporter).await?;

    print_summary(&run);

    // Save outputs
    std::fs::create_dir_all(&args.output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = args.output.join(format!("report-{timestamp}.json"));
                run.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = args.output.join(format!("report-{timestamp}.html"));
                write_html_report(&run, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "csv" => {
                let path = args.output.join(format!("report-{timestamp}.csv"));
                write_csv_report(&run, &answers, &path)?;
                eprintln!("CSV report: {}", path.display());
            }
            "md" => {
                let path = args.output.join(format!("report-{timestamp}.md"));
                std::fs::write(&path, run.to_markdown())?;
                eprintln!("Markdown report: {}", path.display());
            }
            other => anyhow::bail!("unknown format: {other}"),
        }
    }

    Ok(())
}

fn print_summary(run: &CohortRun) {
    use comfy_table::{Cell, Table};

    let report = &run.report;

    let mut totals = Table::new();
    totals.set_header(vec![
        "Students",
        "Suspicious exams",
        "Collusion pairs",
        "High risk",
        "Avg similarity",
        "Comparisons",
    ]);
    totals.add_row(vec![
        Cell::new(report.total_students),
        Cell::new(report.suspicious_ai_count),
        Cell::new(report.collusion_pair_count),
        Cell::new(report.high_risk_pairs),
        Cell::new(format!("{:.1}%", report.average_similarity_score * 100.0)),
        Cell::new(format!(
            "{}{}",
            run.total_comparisons,
            if run.partial { " (partial)" } else { "" }
        )),
    ]);
    println!("\n{totals}");

    if !report.collusion_pairs.is_empty() {
        let mut pairs = Table::new();
        pairs.set_header(vec!["Question", "Student A", "Student B", "Combined", "Level"]);
        for p in &report.collusion_pairs {
            pairs.add_row(vec![
                Cell::new(p.question_index + 1),
                Cell::new(&p.student_a),
                Cell::new(&p.student_b),
                Cell::new(format!("{:.1}%", p.combined_score * 100.0)),
                Cell::new(p.level),
            ]);
        }
        println!("{pairs}");
    }

    let flagged: Vec<_> = report
        .exam_summaries
        .iter()
        .filter(|s| s.exam_suspicious)
        .collect();
    if !flagged.is_empty() {
        let mut exams = Table::new();
        exams.set_header(vec!["Student", "Level", "Max", "Avg", "Flagged answers"]);
        for s in flagged {
            exams.add_row(vec![
                Cell::new(&s.student_id),
                Cell::new(s.level),
                Cell::new(s.max_score),
                Cell::new(format!("{:.1}", s.avg_score)),
                Cell::new(format!("{}/{}", s.suspicious_answer_count, s.total_questions)),
            ]);
        }
        println!("{exams}");
    }
}
