//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use examguard_core::report::CohortRun;

use crate::highlight::highlight_evidence;
use crate::html_escape;

/// Generate an HTML report from a cohort run.
pub fn generate_html(run: &CohortRun) -> String {
    let report = &run.report;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>examguard report {}</title>\n", run.id));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>examguard report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} answers | {} comparisons | {} ms | {}</p>\n",
        run.total_answers,
        run.total_comparisons,
        run.duration_ms,
        run.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if run.partial {
        html.push_str("<p class=\"warning\">Partial results: the comparison budget was reached before every pair was compared.</p>\n");
    }
    if run.failed_tasks > 0 {
        html.push_str(&format!(
            "<p class=\"warning\">{} analysis task(s) failed and are missing from this report.</p>\n",
            run.failed_tasks
        ));
    }
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n<tbody>\n");
    for (label, value) in [
        ("Students", report.total_students.to_string()),
        ("Suspicious exams", report.suspicious_ai_count.to_string()),
        ("Collusion pairs", report.collusion_pair_count.to_string()),
        ("High-risk pairs", report.high_risk_pairs.to_string()),
        (
            "Average pair similarity",
            format!("{:.1}%", report.average_similarity_score * 100.0),
        ),
    ] {
        html.push_str(&format!("<tr><th>{label}</th><td>{value}</td></tr>\n"));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Collusion pairs
    html.push_str("<section class=\"pairs\">\n");
    html.push_str("<h2>Collusion pairs</h2>\n");
    if report.collusion_pairs.is_empty() {
        html.push_str("<p>No pairs reached the similarity threshold.</p>\n");
    } else {
        html.push_str("<table class=\"results-table\" id=\"pairs\">\n");
        html.push_str("<thead><tr><th onclick=\"sortTable('pairs', 0)\">Question</th><th onclick=\"sortTable('pairs', 1)\">Student A</th><th onclick=\"sortTable('pairs', 2)\">Student B</th><th onclick=\"sortTable('pairs', 3)\">Combined</th><th>Jaccard</th><th>Levenshtein</th><th>Sequence</th><th onclick=\"sortTable('pairs', 7)\">Level</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for p in &report.collusion_pairs {
            html.push_str(&format!(
                "<tr class=\"level-{level}\"><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{level}</td></tr>\n",
                p.question_index + 1,
                html_escape(&p.student_a),
                html_escape(&p.student_b),
                p.combined_score * 100.0,
                p.jaccard,
                p.levenshtein,
                p.sequence_score,
                level = p.level,
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Exam verdicts
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Exams</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"exams\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable('exams', 0)\">Student</th><th onclick=\"sortTable('exams', 1)\">Level</th><th onclick=\"sortTable('exams', 2)\">Max</th><th onclick=\"sortTable('exams', 3)\">Avg</th><th>Flagged</th><th>Verdict</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in &report.exam_summaries {
        let verdict = if s.exam_suspicious { "suspicious" } else { "clear" };
        html.push_str(&format!(
            "<tr class=\"level-{level}\"><td>{}</td><td>{level}</td><td>{}</td><td>{:.1}</td><td>{}/{}</td><td>{verdict}</td></tr>\n",
            html_escape(&s.student_id),
            s.max_score,
            s.avg_score,
            s.suspicious_answer_count,
            s.total_questions,
            level = s.level,
        ));
    }
    html.push_str("</tbody></table>\n");

    for s in report.exam_summaries.iter().filter(|s| !s.details.is_empty()) {
        html.push_str(&format!(
            "<details class=\"evidence\">\n<summary>{} ({} flagged answer(s))</summary>\n",
            html_escape(&s.student_id),
            s.details.len()
        ));
        for d in &s.details {
            html.push_str(&format!(
                "<h3>Question {} | score {} | {}</h3>\n",
                d.question_index + 1,
                d.score,
                html_escape(&d.summary)
            ));
            html.push_str("<ul>\n");
            for e in &d.evidence {
                html.push_str(&format!(
                    "<li><span class=\"badge {}\">{}</span> {}: {}</li>\n",
                    e.severity,
                    e.severity,
                    html_escape(&e.rule_name),
                    html_escape(&e.description)
                ));
            }
            html.push_str("</ul>\n");
            html.push_str("<pre><code>");
            html.push_str(&highlight_evidence(&d.answer_text, &d.evidence));
            html.push_str("</code></pre>\n");
        }
        html.push_str("</details>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(run).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(run: &CohortRun, path: &Path) -> Result<()> {
    let html = generate_html(run);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    tracing::debug!("wrote HTML report to {}", path.display());
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --high: #fde2e2; --medium: #fef3c7; --low: transparent; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --high: #7f1d1d; --medium: #78350f; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
h3 { font-size: 1rem; margin: 1rem 0 0.25rem; }
.meta { color: #6b7280; }
.warning { color: #b45309; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.level-high { background: var(--high); }
.level-medium { background: var(--medium); }
.badge { border-radius: 4px; padding: 0 0.4rem; font-size: 0.8rem; }
.badge.high, .ai-trap-high { background: #ef4444; color: #fff; }
.badge.medium, .ai-trap-medium { background: #eab308; color: #1a1a1a; }
.badge.low, .ai-trap-low { background: #93c5fd; color: #1a1a1a; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; white-space: pre-wrap; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;

const JS: &str = r#"
function sortTable(id, col) {
  const table = document.getElementById(id);
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::make_test_run;

    #[test]
    fn html_report_contains_required_elements() {
        let run = make_test_run();
        let html = generate_html(&run);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Collusion pairs"));
        assert!(html.contains("<td>alice</td>"));
        assert!(html.contains("100.0%"));
        assert!(html.contains("ai-trap-high"));
    }

    #[test]
    fn html_escapes_student_ids() {
        let mut run = make_test_run();
        run.report.exam_summaries[0].student_id = "<script>x</script>".into();
        let html = generate_html(&run);
        assert!(!html.contains("<td><script>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    }

    #[test]
    fn html_flags_partial_runs() {
        let mut run = make_test_run();
        assert!(!generate_html(&run).contains("Partial results"));
        run.partial = true;
        assert!(generate_html(&run).contains("Partial results"));
    }

    #[test]
    fn html_report_write_to_file() {
        let run = make_test_run();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&run, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
