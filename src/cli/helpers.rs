//! Shared helper functions for CLI commands

use anyhow::Context;
use scrivener_core::evolution::JobReport;
use scrivener_core::ScrivenerConfig;
use std::path::Path;
use tracing::debug;

/// Load and validate the configuration, falling back to defaults when no
/// file was given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ScrivenerConfig> {
    let config = match path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            ScrivenerConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => ScrivenerConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

pub fn print_job_report(title: &str, report: &JobReport) {
    println!("✓ {} complete:", title);
    println!("  Items processed: {}", report.items_processed);
    println!("  Changes made: {}", report.changes_made);
    println!("  Errors: {}", report.errors);
    println!("  Duration: {:?}", report.duration);
    for output in &report.outputs {
        println!("  Wrote: {}", output.display());
    }
}
