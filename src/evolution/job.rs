// Pipeline Jobs
//
// Common shape for the runnable pipeline stages (improvement cycle,
// proofreading pass, evolution report) so the CLI can run and report on
// them uniformly.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Report generated after job execution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobReport {
    /// Number of articles or records processed
    pub items_processed: usize,

    /// Number of documents or stores changed
    pub changes_made: usize,

    /// Duration of job execution
    #[serde(with = "serde_duration_millis")]
    pub duration: Duration,

    /// Number of items skipped because of errors
    pub errors: usize,

    /// Files written by the job
    pub outputs: Vec<PathBuf>,
}

// Duration as milliseconds
mod serde_duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// A runnable pipeline stage
#[async_trait]
pub trait PipelineJob: Send + Sync {
    /// Job name (for logging)
    fn name(&self) -> &str;

    /// Run the job once
    async fn run(&self) -> Result<JobReport>;
}

/// Run `job`, stamping the report with its wall-clock duration
pub async fn run_job(job: &dyn PipelineJob) -> Result<JobReport> {
    info!("Running {}", job.name());
    let started = Instant::now();

    match job.run().await {
        Ok(mut report) => {
            report.duration = started.elapsed();
            info!(
                "{} complete: {} processed, {} changed, {} errors in {:?}",
                job.name(),
                report.items_processed,
                report.changes_made,
                report.errors,
                report.duration
            );
            Ok(report)
        }
        Err(e) => {
            error!("{} failed: {}", job.name(), e);
            Err(e)
        }
    }
}
