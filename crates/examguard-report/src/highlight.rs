//! Marks trap evidence inside an answer as HTML spans.

use std::collections::HashSet;

use examguard_core::model::Severity;
use examguard_core::traps::TrapEvidence;
use regex::RegexBuilder;

use crate::html_escape;

struct Span {
    start: usize,
    end: usize,
    severity: Severity,
    description: String,
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "ai-trap-high",
        Severity::Medium => "ai-trap-medium",
        Severity::Low => "ai-trap-low",
    }
}

/// Render `text` as escaped HTML with every occurrence of an evidence literal
/// wrapped in a `<span class="ai-trap-{severity}">`.
///
/// Higher-severity evidence claims text first; a later match overlapping an
/// already marked region is left unmarked. Literals are matched
/// case-insensitively, on word boundaries where the literal starts or ends
/// with a word character.
pub fn highlight_evidence(text: &str, evidence: &[TrapEvidence]) -> String {
    if text.is_empty() || evidence.is_empty() {
        return html_escape(text);
    }

    let mut ordered: Vec<&TrapEvidence> = evidence.iter().collect();
    ordered.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut seen = HashSet::new();
    let mut spans: Vec<Span> = Vec::new();

    for trap in ordered {
        for literal in &trap.matched_strings {
            if literal.is_empty() || !seen.insert(literal.to_lowercase()) {
                continue;
            }

            let Ok(regex) = RegexBuilder::new(&literal_pattern(literal))
                .case_insensitive(true)
                .build()
            else {
                tracing::debug!("cannot highlight literal {literal:?}");
                continue;
            };

            for m in regex.find_iter(text) {
                let overlaps = spans.iter().any(|s| m.start() < s.end && s.start < m.end());
                if !overlaps {
                    spans.push(Span {
                        start: m.start(),
                        end: m.end(),
                        severity: trap.severity,
                        description: trap.description.clone(),
                    });
                }
            }
        }
    }

    spans.sort_by_key(|s| s.start);

    let mut out = String::with_capacity(text.len() + spans.len() * 48);
    let mut cursor = 0;
    for span in &spans {
        out.push_str(&html_escape(&text[cursor..span.start]));
        out.push_str(&format!(
            "<span class=\"{}\" title=\"{}\">{}</span>",
            severity_class(span.severity),
            html_escape(&span.description),
            html_escape(&text[span.start..span.end])
        ));
        cursor = span.end;
    }
    out.push_str(&html_escape(&text[cursor..]));
    out
}

fn literal_pattern(literal: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let leading = literal.chars().next().is_some_and(is_word);
    let trailing = literal.chars().last().is_some_and(is_word);
    format!(
        "{}{}{}",
        if leading { r"\b" } else { "" },
        regex::escape(literal),
        if trailing { r"\b" } else { "" }
    )
}
