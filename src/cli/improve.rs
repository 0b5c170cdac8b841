//! Run one improvement cycle

use super::helpers::print_job_report;
use anyhow::Context;
use scrivener_core::evolution::{run_job, ImprovementCycle};
use scrivener_core::ScrivenerConfig;

pub async fn handle(config: ScrivenerConfig) -> anyhow::Result<()> {
    println!("Running improvement cycle...");
    let cycle = ImprovementCycle::new(config);
    let report = run_job(&cycle)
        .await
        .context("Improvement cycle failed")?;
    print_job_report("Improvement cycle", &report);
    Ok(())
}
