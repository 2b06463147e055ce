//! The `examguard validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examguard_core::parser::{parse_rule_file, validate_rules};
use examguard_core::traps::TrapScorer;

pub fn execute(rules_path: PathBuf) -> Result<()> {
    let rules = parse_rule_file(&rules_path)?;
    println!("Rule table: {} ({} rules)", rules_path.display(), rules.len());

    let warnings = validate_rules(&rules);
    for w in &warnings {
        let prefix = w
            .rule_name
            .as_ref()
            .map(|name| format!("  [{name}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    TrapScorer::new(rules)
        .with_context(|| format!("rule table cannot be loaded: {}", rules_path.display()))?;

    if warnings.is_empty() {
        println!("All rules valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
