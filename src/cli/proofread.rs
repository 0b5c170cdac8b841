//! Proofread one article

use anyhow::Context;
use scrivener_core::proofreading::ProofreadingPass;
use scrivener_core::ScrivenerConfig;
use std::path::PathBuf;

pub async fn handle(config: &ScrivenerConfig, file: PathBuf, apply: bool) -> anyhow::Result<()> {
    let pass = ProofreadingPass::new(config, file.clone(), apply)
        .context("Failed to set up proofreader")?;
    let outcome = pass
        .execute()
        .await
        .with_context(|| format!("Failed to proofread {}", file.display()))?;
    let result = &outcome.result;

    println!("{}: {} issue(s)", result.article_id, result.issues_found.len());
    for issue in &result.issues_found {
        println!(
            "  [{}] {} @ {}: {} -> {}",
            issue.severity, issue.issue_type, issue.location, issue.original, issue.suggestion
        );
    }
    println!(
        "  Score: {} -> {} ({} correction(s))",
        result.original_score,
        result.final_score,
        result.corrections.len()
    );

    if outcome.applied {
        println!("✓ Corrections written to {}", file.display());
    } else if result.auto_corrected {
        println!("  Run with --apply to write the corrections");
    }
    if let Some(update) = &outcome.rule_update {
        println!("✓ Proofreading rules updated to v{}", update.version.version);
    }
    Ok(())
}
