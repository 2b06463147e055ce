//! Weighted trap-rule scoring of a single answer.
//!
//! Each rule contributes `points * min(unique_matches, 3)`; the total is
//! capped at 100. The rule table is compiled once at construction and is
//! immutable afterwards.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::model::{PatternRule, Severity};
use crate::rules::default_rules;

/// Scores at or above this value mark an answer as suspicious.
pub const SUSPICIOUS_SCORE: u32 = 20;

/// Upper bound of the suspicion score.
pub const MAX_SCORE: u32 = 100;

/// Unique matches beyond this count add nothing for a rule.
pub const MAX_COUNTED_MATCHES: usize = 3;

/// Compiled-program size limit per rule pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Capture group that, when present, names the recorded literal.
const HIT_GROUP: &str = "hit";

static DEFAULT_SCORER: LazyLock<TrapScorer> = LazyLock::new(|| {
    TrapScorer::new(default_rules()).expect("built-in rule table is valid")
});

/// Evidence that one rule fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrapEvidence {
    pub rule_name: String,
    pub description: String,
    pub severity: Severity,
    /// Unique literal matches in first-seen order.
    pub matched_strings: Vec<String>,
}

/// Outcome of scoring one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspicionResult {
    /// Always `score >= SUSPICIOUS_SCORE`.
    pub is_suspicious: bool,
    pub score: u32,
    pub evidence: Vec<TrapEvidence>,
    pub summary: String,
}

impl SuspicionResult {
    /// Result for blank input.
    pub fn no_content() -> Self {
        Self {
            is_suspicious: false,
            score: 0,
            evidence: Vec::new(),
            summary: "no content".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: PatternRule,
    regex: Regex,
    /// Record the `hit` group rather than the whole match.
    hit_group: bool,
}

impl CompiledRule {
    fn literals<'t>(&self, text: &'t str) -> Vec<&'t str> {
        if self.hit_group {
            self.regex
                .captures_iter(text)
                .filter_map(|caps| caps.name(HIT_GROUP).or_else(|| caps.get(0)))
                .map(|m| m.as_str())
                .collect()
        } else {
            self.regex.find_iter(text).map(|m| m.as_str()).collect()
        }
    }
}

/// Evaluates answers against an ordered, immutable rule table.
#[derive(Debug, Clone)]
pub struct TrapScorer {
    rules: Vec<CompiledRule>,
}

impl TrapScorer {
    /// Compile a rule table. Fails on the first invalid rule.
    pub fn new(rules: Vec<PatternRule>) -> Result<Self, RuleError> {
        if rules.is_empty() {
            return Err(RuleError::EmptyTable);
        }

        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(rules.len());

        for (position, rule) in rules.into_iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(RuleError::EmptyName(position));
            }
            if !seen.insert(rule.name.clone()) {
                return Err(RuleError::DuplicateName(rule.name));
            }

            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .size_limit(PATTERN_SIZE_LIMIT)
                .build()
                .map_err(|source| RuleError::InvalidPattern {
                    name: rule.name.clone(),
                    source,
                })?;

            if regex.is_match("") {
                return Err(RuleError::MatchesEmpty(rule.name));
            }

            let hit_group = regex.capture_names().any(|name| name == Some(HIT_GROUP));
            compiled.push(CompiledRule {
                rule,
                regex,
                hit_group,
            });
        }

        Ok(Self { rules: compiled })
    }

    /// A scorer over the built-in SQL exam rule table.
    pub fn with_default_rules() -> Self {
        DEFAULT_SCORER.clone()
    }

    /// The rule table in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Score one answer text.
    pub fn score(&self, text: &str) -> SuspicionResult {
        if text.trim().is_empty() {
            return SuspicionResult::no_content();
        }

        let mut evidence = Vec::new();
        let mut total: u64 = 0;

        for compiled in &self.rules {
            let rule = &compiled.rule;
            let mut seen = HashSet::new();
            let matched_strings: Vec<String> = compiled
                .literals(text)
                .into_iter()
                .filter(|literal| seen.insert(*literal))
                .map(str::to_string)
                .collect();

            if matched_strings.is_empty() {
                continue;
            }

            let counted = matched_strings.len().min(MAX_COUNTED_MATCHES) as u64;
            total += u64::from(rule.points) * counted;
            tracing::trace!(
                "rule {} matched {} unique literal(s)",
                rule.name,
                matched_strings.len()
            );

            evidence.push(TrapEvidence {
                rule_name: rule.name.clone(),
                description: rule.description.clone(),
                severity: rule.severity,
                matched_strings,
            });
        }

        let score = total.min(u64::from(MAX_SCORE)) as u32;
        let summary = summarize(score, evidence.len());

        SuspicionResult {
            is_suspicious: score >= SUSPICIOUS_SCORE,
            score,
            evidence,
            summary,
        }
    }
}

impl Default for TrapScorer {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

fn summarize(score: u32, findings: usize) -> String {
    if findings == 0 {
        "no indicators".to_string()
    } else if score >= 70 {
        format!("very suspicious ({findings} findings)")
    } else if score >= 40 {
        format!("suspicious ({findings} findings)")
    } else {
        format!("low suspicion ({findings} findings)")
    }
}

/// Score an answer against the built-in rule table.
pub fn score_answer(text: &str) -> SuspicionResult {
    DEFAULT_SCORER.score(text)
}
