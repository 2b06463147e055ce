//! Typed errors for rule-table construction and configuration.
//!
//! Text scoring itself never fails; these errors only surface when a rule
//! table or configuration is loaded and validated.

use thiserror::Error;

/// Errors raised while compiling a trap rule table.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule table contains no rules.
    #[error("rule table is empty")]
    EmptyTable,

    /// A rule's pattern failed to compile.
    #[error("rule '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Two rules share the same name.
    #[error("duplicate rule name: {0}")]
    DuplicateName(String),

    /// A rule has an empty name.
    #[error("rule at position {0} has an empty name")]
    EmptyName(usize),

    /// A rule pattern matches the empty string, which would match everywhere.
    #[error("rule '{0}' matches the empty string")]
    MatchesEmpty(String),
}

/// Errors raised when an analysis configuration is out of range.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("similarity_threshold must be between 0.0 and 1.0, got {0}")]
    SimilarityThreshold(f64),

    #[error("ai_threshold must be between 0 and 100, got {0}")]
    AiThreshold(u32),

    #[error("parallelism must be at least 1")]
    Parallelism,

    #[error("vocabulary must not contain empty terms")]
    EmptyVocabularyTerm,
}

impl RuleError {
    /// The name of the offending rule, when the error concerns a single rule.
    pub fn rule_name(&self) -> Option<&str> {
        match self {
            RuleError::InvalidPattern { name, .. } => Some(name),
            RuleError::DuplicateName(name) | RuleError::MatchesEmpty(name) => Some(name),
            RuleError::EmptyTable | RuleError::EmptyName(_) => None,
        }
    }
}
