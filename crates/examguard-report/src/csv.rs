//! CSV export of a cohort run.
//!
//! Three sections separated by blank lines: run statistics, collusion pairs,
//! then one row per flagged answer of each suspicious exam. Student names,
//! emails, and answer texts are looked up in the original answer records.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use examguard_core::model::Answer;
use examguard_core::report::CohortRun;

/// Answer texts longer than this are cut in the export.
pub const MAX_EXPORTED_ANSWER_CHARS: usize = 500;

/// Byte-order mark so spreadsheet tools read the file as UTF-8.
const BOM: &str = "\u{FEFF}";

/// Leading characters that make spreadsheet tools read a cell as a formula.
const FORMULA_PREFIXES: [char; 4] = ['=', '+', '-', '@'];

/// Quote a field when it contains a comma, quote, or line break. A field that
/// would be read as a formula is prefixed with `'`.
pub fn escape_csv(value: &str) -> String {
    let value = if value.starts_with(FORMULA_PREFIXES) {
        format!("'{value}")
    } else {
        value.to_string()
    };
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

fn answer_cell(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
        .chars()
        .take(MAX_EXPORTED_ANSWER_CHARS)
        .collect()
}

fn push_row<S: AsRef<str>>(csv: &mut String, fields: &[S]) {
    let row: Vec<String> = fields.iter().map(|f| escape_csv(f.as_ref())).collect();
    csv.push_str(&row.join(","));
    csv.push('\n');
}

struct AnswerIndex<'a> {
    by_student: HashMap<&'a str, &'a Answer>,
    by_item: HashMap<(&'a str, u32), &'a Answer>,
}

impl<'a> AnswerIndex<'a> {
    fn new(answers: &'a [Answer]) -> Self {
        let mut by_student = HashMap::new();
        let mut by_item = HashMap::new();
        for answer in answers {
            let key = answer.student_key();
            by_student.entry(key).or_insert(answer);
            by_item.entry((key, answer.question_index)).or_insert(answer);
        }
        Self {
            by_student,
            by_item,
        }
    }

    fn name(&self, student: &str) -> &'a str {
        self.by_student
            .get(student)
            .and_then(|a| a.student_name.as_deref())
            .unwrap_or("")
    }

    fn email(&self, student: &str) -> &'a str {
        self.by_student
            .get(student)
            .and_then(|a| a.student_email.as_deref())
            .unwrap_or("")
    }

    fn exam_id(&self, student: &str) -> &'a str {
        self.by_student
            .get(student)
            .map(|a| a.exam_id.as_str())
            .unwrap_or("")
    }

    fn item(&self, student: &str, question_index: u32) -> Option<&'a Answer> {
        self.by_item.get(&(student, question_index)).copied()
    }
}

/// Render a cohort run as CSV.
pub fn generate_csv(run: &CohortRun, answers: &[Answer]) -> String {
    let report = &run.report;
    let index = AnswerIndex::new(answers);
    let mut csv = String::new();

    push_row(&mut csv, &["Statistic", "Value"]);
    for (label, value) in [
        ("Exams analyzed", report.total_students.to_string()),
        ("Collusion pairs", report.collusion_pair_count.to_string()),
        ("Suspected AI assistance", report.suspicious_ai_count.to_string()),
        (
            "Average similarity (reported pairs)",
            format!("{}%", (report.average_similarity_score * 100.0).round()),
        ),
        ("High-risk pairs", report.high_risk_pairs.to_string()),
        ("Partial results", run.partial.to_string()),
        ("Report date", run.created_at.format("%Y-%m-%d").to_string()),
    ] {
        push_row(&mut csv, &[label.to_string(), value]);
    }

    csv.push_str("\n\n");
    push_row(
        &mut csv,
        &[
            "Finding",
            "Student 1 name",
            "Student 1 id",
            "Student 1 email",
            "Student 2 name",
            "Student 2 id",
            "Student 2 email",
            "Question",
            "Question text",
            "Similarity (%)",
            "Level",
            "Student 1 answer",
            "Student 2 answer",
        ],
    );
    for p in &report.collusion_pairs {
        let item_a = index.item(&p.student_a, p.question_index);
        let item_b = index.item(&p.student_b, p.question_index);
        let question_text = item_a
            .or(item_b)
            .map(|a| a.question_text.as_str())
            .unwrap_or("");
        push_row(
            &mut csv,
            &[
                "Answer similarity".to_string(),
                index.name(&p.student_a).to_string(),
                p.student_a.clone(),
                index.email(&p.student_a).to_string(),
                index.name(&p.student_b).to_string(),
                p.student_b.clone(),
                index.email(&p.student_b).to_string(),
                (p.question_index + 1).to_string(),
                question_text.to_string(),
                format!("{}", (p.combined_score * 100.0).round()),
                p.level.to_string(),
                answer_cell(item_a.map(|a| a.answer_text.as_str()).unwrap_or("")),
                answer_cell(item_b.map(|a| a.answer_text.as_str()).unwrap_or("")),
            ],
        );
    }

    csv.push_str("\n\n");
    push_row(
        &mut csv,
        &[
            "Finding",
            "Student name",
            "Student id",
            "Email",
            "Exam id",
            "Total questions",
            "Suspicious answers",
            "Max score",
            "Average score",
            "Level",
            "Question",
            "Question text",
            "Answer",
            "Triggered rules",
        ],
    );
    for s in report.exam_summaries.iter().filter(|s| s.exam_suspicious) {
        let id = s.student_id.as_str();
        let head = [
            "External/AI assistance".to_string(),
            index.name(id).to_string(),
            s.student_id.clone(),
            index.email(id).to_string(),
            index.exam_id(id).to_string(),
            s.total_questions.to_string(),
            s.suspicious_answer_count.to_string(),
            s.max_score.to_string(),
            format!("{:.1}", s.avg_score),
            s.level.to_string(),
        ];

        if s.details.is_empty() {
            let mut row = head.to_vec();
            row.extend(std::iter::repeat(String::new()).take(4));
            push_row(&mut csv, &row[..]);
            continue;
        }

        for d in &s.details {
            let question_text = index
                .item(id, d.question_index)
                .map(|a| a.question_text.as_str())
                .unwrap_or("");
            let rules: Vec<&str> = d.evidence.iter().map(|e| e.rule_name.as_str()).collect();
            let mut row = head.to_vec();
            row.extend([
                (d.question_index + 1).to_string(),
                question_text.to_string(),
                answer_cell(&d.answer_text),
                rules.join("; "),
            ]);
            push_row(&mut csv, &row[..]);
        }
    }

    csv
}

/// Write a CSV report, prefixed with a UTF-8 byte-order mark.
pub fn write_csv_report(run: &CohortRun, answers: &[Answer], path: &Path) -> Result<()> {
    let csv = generate_csv(run, answers);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format!("{BOM}{csv}"))
        .with_context(|| format!("failed to write CSV report to {}", path.display()))?;
    tracing::debug!("wrote CSV report to {}", path.display());
    Ok(())
}
