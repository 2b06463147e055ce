//! The `examguard compare` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examguard_core::config::load_config;

pub fn execute(a_path: PathBuf, b_path: PathBuf, json: bool) -> Result<()> {
    let a = std::fs::read_to_string(&a_path)
        .with_context(|| format!("failed to read {}", a_path.display()))?;
    let b = std::fs::read_to_string(&b_path)
        .with_context(|| format!("failed to read {}", b_path.display()))?;

    let config = load_config()?;
    let similarity = config.similarity_engine().compare(&a, &b);

    if json {
        println!("{}", serde_json::to_string_pretty(&similarity)?);
        return Ok(());
    }

    println!(
        "Combined: {:.1}% ({})",
        similarity.combined_score * 100.0,
        similarity.level
    );
    println!("  Jaccard:     {:.3}", similarity.jaccard);
    println!("  Levenshtein: {:.3}", similarity.levenshtein);
    println!("  Sequence:    {:.3}", similarity.sequence_score);

    if similarity.combined_score >= config.similarity_threshold {
        println!(
            "\nAt or above the reporting threshold ({:.0}%).",
            config.similarity_threshold * 100.0
        );
    }

    Ok(())
}
