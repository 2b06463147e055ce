//! Analysis configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::normalize::DEFAULT_VOCABULARY;
use crate::similarity::SimilarityEngine;

/// Settings for a cohort analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Combined similarity at which a pair is reported, in `[0, 1]`.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Per-answer trap score at which an answer is flagged, in `[0, 100]`.
    #[serde(default = "default_ai_threshold")]
    pub ai_threshold: u32,
    /// Max concurrent analysis tasks.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Compare only this many leading characters of each answer.
    #[serde(default)]
    pub max_text_chars: Option<usize>,
    /// Pairwise comparisons allowed per run. `0` disables the budget.
    #[serde(default = "default_max_comparisons")]
    pub max_comparisons: Option<usize>,
    /// Answers shorter than this (after trimming) are left out.
    #[serde(default = "default_min_answer_chars")]
    pub min_answer_chars: usize,
    /// Rule table to load instead of the built-in one.
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
    /// Keyword vocabulary for the sequence metric.
    #[serde(default)]
    pub vocabulary: Option<Vec<String>>,
}

fn default_similarity_threshold() -> f64 {
    0.8
}
fn default_ai_threshold() -> u32 {
    30
}
fn default_parallelism() -> usize {
    4
}
fn default_max_comparisons() -> Option<usize> {
    Some(5000)
}
fn default_min_answer_chars() -> usize {
    10
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            ai_threshold: default_ai_threshold(),
            parallelism: default_parallelism(),
            max_text_chars: None,
            max_comparisons: default_max_comparisons(),
            min_answer_chars: default_min_answer_chars(),
            rules_path: None,
            vocabulary: None,
        }
    }
}

impl AnalysisConfig {
    /// Check every option is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::SimilarityThreshold(self.similarity_threshold));
        }
        if self.ai_threshold > 100 {
            return Err(ConfigError::AiThreshold(self.ai_threshold));
        }
        if self.parallelism == 0 {
            return Err(ConfigError::Parallelism);
        }
        if let Some(vocabulary) = &self.vocabulary {
            if vocabulary.iter().any(|term| term.trim().is_empty()) {
                return Err(ConfigError::EmptyVocabularyTerm);
            }
        }
        Ok(())
    }

    /// The comparison budget, `None` when unlimited.
    pub fn comparison_budget(&self) -> Option<usize> {
        self.max_comparisons.filter(|&n| n > 0)
    }

    /// A similarity engine using this config's vocabulary and length cap.
    pub fn similarity_engine(&self) -> SimilarityEngine {
        let vocabulary = match &self.vocabulary {
            Some(terms) => terms.clone(),
            None => DEFAULT_VOCABULARY.iter().map(|s| s.to_string()).collect(),
        };
        SimilarityEngine::new(vocabulary).with_max_text_chars(self.max_text_chars)
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examguard.toml` in the current directory
/// 2. `~/.config/examguard/config.toml`
///
/// Environment variable overrides: `EXAMGUARD_SIMILARITY_THRESHOLD`,
/// `EXAMGUARD_AI_THRESHOLD`, `EXAMGUARD_PARALLELISM`.
pub fn load_config() -> Result<AnalysisConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AnalysisConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examguard.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config_file(&path)?
        }
        None => AnalysisConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate().context("invalid configuration")?;

    Ok(config)
}

/// Parse a config file without searching or applying overrides.
pub fn parse_config_file(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<AnalysisConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

/// Apply `EXAMGUARD_*` overrides fetched through `lookup`.
pub fn apply_env_overrides<F>(config: &mut AnalysisConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("EXAMGUARD_SIMILARITY_THRESHOLD") {
        config.similarity_threshold = value
            .trim()
            .parse()
            .with_context(|| format!("invalid EXAMGUARD_SIMILARITY_THRESHOLD: {value}"))?;
    }
    if let Some(value) = lookup("EXAMGUARD_AI_THRESHOLD") {
        config.ai_threshold = value
            .trim()
            .parse()
            .with_context(|| format!("invalid EXAMGUARD_AI_THRESHOLD: {value}"))?;
    }
    if let Some(value) = lookup("EXAMGUARD_PARALLELISM") {
        config.parallelism = value
            .trim()
            .parse()
            .with_context(|| format!("invalid EXAMGUARD_PARALLELISM: {value}"))?;
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examguard"))
}
