//! Generate the evolution report

use anyhow::Context;
use scrivener_core::evolution::EvolutionTracker;
use scrivener_core::storage::run_blocking;
use scrivener_core::ScrivenerConfig;

pub async fn handle(config: &ScrivenerConfig, print: bool) -> anyhow::Result<()> {
    let tracker = EvolutionTracker::new(config);
    let report = run_blocking(move || tracker.generate_report())
        .await
        .context("Failed to generate evolution report")?;

    if print {
        println!("{}", report.markdown);
    }
    println!(
        "✓ Evolution report {} written to {} (score {:.1}, grade {})",
        report.session_id,
        report.path.display(),
        report.analysis.overall_score.overall_score,
        report.analysis.overall_score.grade
    );
    Ok(())
}
