//! The `examguard init` command.

use std::path::Path;

use anyhow::{Context, Result};

use examguard_core::parser::rules_to_toml;
use examguard_core::rules::default_rules;

pub fn execute() -> Result<()> {
    // Create examguard.toml
    if Path::new("examguard.toml").exists() {
        println!("examguard.toml already exists, skipping.");
    } else {
        std::fs::write("examguard.toml", SAMPLE_CONFIG).context("failed to write examguard.toml")?;
        println!("Created examguard.toml");
    }

    // Create the editable rule table
    std::fs::create_dir_all("rules")?;
    let rules_path = Path::new("rules/default.toml");
    if rules_path.exists() {
        println!("rules/default.toml already exists, skipping.");
    } else {
        let mut content = String::from(RULES_HEADER);
        content.push_str(&rules_to_toml(&default_rules())?);
        std::fs::write(rules_path, content).context("failed to write rules/default.toml")?;
        println!("Created rules/default.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust thresholds in examguard.toml");
    println!("  2. Run: examguard validate --rules rules/default.toml");
    println!("  3. Run: examguard analyze --answers answers.json --format all");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examguard configuration

# Combined similarity (0.0-1.0) at which an answer pair is reported.
similarity_threshold = 0.8

# Per-answer trap score (0-100) at which an answer is flagged.
ai_threshold = 30

# Max concurrent analysis tasks.
parallelism = 4

# Pairwise comparisons allowed per run (0 = unlimited).
max_comparisons = 5000

# Answers shorter than this many characters are skipped.
min_answer_chars = 10

# Compare only the first N characters of each answer.
# max_text_chars = 4000

# Rule table to use instead of the built-in one.
# rules_path = "rules/default.toml"

# Keyword vocabulary for the sequence metric.
# vocabulary = ["SELECT", "FROM", "WHERE", "JOIN", "GROUP BY", "HAVING", "ORDER BY", "INSERT", "UPDATE", "DELETE"]
"#;

const RULES_HEADER: &str = "# examguard trap rules\n#\n# Each rule adds `points` per unique match, counting up to three matches.\n# Patterns are case-insensitive regular expressions.\n\n";
