//! Rule table and answer file parsing.
//!
//! Rule tables are TOML files with a `[[rules]]` array; answer exports are
//! JSON arrays of [`Answer`] records.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::model::{Answer, PatternRule, Severity};
use crate::traps::TrapScorer;

#[derive(Debug, Deserialize)]
struct TomlRuleFile {
    #[serde(default)]
    rules: Vec<TomlRule>,
}

#[derive(Debug, Deserialize)]
struct TomlRule {
    name: String,
    #[serde(default)]
    description: String,
    pattern: String,
    #[serde(default = "default_severity")]
    severity: String,
    points: u32,
}

fn default_severity() -> String {
    "medium".to_string()
}

#[derive(Serialize)]
struct RuleFileOut<'a> {
    rules: &'a [PatternRule],
}

/// Parse a rule table file.
pub fn parse_rule_file(path: &Path) -> Result<Vec<PatternRule>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rule file: {}", path.display()))?;

    parse_rules_str(&content, path)
}

/// Parse a TOML rule table string.
pub fn parse_rules_str(content: &str, source_path: &Path) -> Result<Vec<PatternRule>> {
    let parsed: TomlRuleFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    parsed
        .rules
        .into_iter()
        .map(|r| {
            let severity: Severity = r
                .severity
                .parse()
                .map_err(|e: String| anyhow::anyhow!("rule '{}': {}", r.name, e))?;
            Ok(PatternRule {
                name: r.name,
                description: r.description,
                pattern: r.pattern,
                severity,
                points: r.points,
            })
        })
        .collect()
}

/// Parse and compile a rule table into a scorer.
pub fn load_rules(path: &Path) -> Result<TrapScorer> {
    let rules = parse_rule_file(path)?;
    TrapScorer::new(rules).with_context(|| format!("invalid rule table: {}", path.display()))
}

/// Render a rule table as TOML that [`parse_rules_str`] reads back.
pub fn rules_to_toml(rules: &[PatternRule]) -> Result<String> {
    toml::to_string_pretty(&RuleFileOut { rules }).context("failed to serialize rule table")
}

/// Accepts a bare array or an object wrapping it under `answers`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerFile {
    List(Vec<Answer>),
    Wrapped { answers: Vec<Answer> },
}

/// Parse a JSON answer export.
pub fn parse_answers_str(content: &str, source_path: &Path) -> Result<Vec<Answer>> {
    let parsed: AnswerFile = serde_json::from_str(content)
        .with_context(|| format!("failed to parse answers JSON: {}", source_path.display()))?;

    Ok(match parsed {
        AnswerFile::List(answers) | AnswerFile::Wrapped { answers } => answers,
    })
}

/// Load a JSON answer export from disk.
pub fn load_answers(path: &Path) -> Result<Vec<Answer>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;

    parse_answers_str(&content, path)
}

/// A warning from rule table validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The rule name (if applicable).
    pub rule_name: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a rule table for common issues.
///
/// Unlike [`TrapScorer::new`], this reports every problem instead of stopping
/// at the first.
pub fn validate_rules(rules: &[PatternRule]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if rules.is_empty() {
        warnings.push(ValidationWarning {
            rule_name: None,
            message: "rule table is empty".into(),
        });
    }

    let mut seen_names = HashSet::new();
    for rule in rules {
        if rule.name.trim().is_empty() {
            warnings.push(ValidationWarning {
                rule_name: None,
                message: "rule has an empty name".into(),
            });
        } else if !seen_names.insert(rule.name.as_str()) {
            warnings.push(ValidationWarning {
                rule_name: Some(rule.name.clone()),
                message: format!("duplicate rule name: {}", rule.name),
            });
        }
    }

    for rule in rules {
        match RegexBuilder::new(&rule.pattern).case_insensitive(true).build() {
            Ok(regex) if regex.is_match("") => warnings.push(ValidationWarning {
                rule_name: Some(rule.name.clone()),
                message: "pattern matches the empty string".into(),
            }),
            Ok(_) => {}
            Err(e) => warnings.push(ValidationWarning {
                rule_name: Some(rule.name.clone()),
                message: format!("pattern does not compile: {e}"),
            }),
        }
    }

    for rule in rules {
        if rule.points == 0 {
            warnings.push(ValidationWarning {
                rule_name: Some(rule.name.clone()),
                message: "points is 0, rule can never contribute".into(),
            });
        }
        if rule.description.trim().is_empty() {
            warnings.push(ValidationWarning {
                rule_name: Some(rule.name.clone()),
                message: "description is empty".into(),
            });
        }
    }

    warnings
}
