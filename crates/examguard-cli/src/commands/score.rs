//! The `examguard score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examguard_core::parser::load_rules;
use examguard_core::traps::TrapScorer;

pub fn execute(
    text: Option<String>,
    file: Option<PathBuf>,
    rules: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read answer file: {}", path.display()))?,
        (None, None) => anyhow::bail!("either --text or --file is required"),
    };

    let scorer = match &rules {
        Some(path) => load_rules(path)?,
        None => TrapScorer::with_default_rules(),
    };

    let result = scorer.score(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let verdict = if result.is_suspicious {
        "suspicious"
    } else {
        "not suspicious"
    };
    println!("Score: {}/100 ({verdict})", result.score);
    println!("Summary: {}", result.summary);

    if !result.evidence.is_empty() {
        println!("\nEvidence:");
        for e in &result.evidence {
            println!("  [{}] {}: {}", e.severity, e.rule_name, e.description);
            for m in &e.matched_strings {
                println!("      {m:?}");
            }
        }
    }

    Ok(())
}
