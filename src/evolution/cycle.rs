// Improvement Cycle
//
// One end-to-end pass: evaluate the most recently modified posts, append
// the records to the evaluation history, evaluate and possibly update the
// writing rules, record the quality trend and write an improvement report.

use super::job::{JobReport, PipelineJob};
use super::rule_evaluator::RuleEvaluator;
use super::rule_updater::{RuleLifecycle, RuleUpdateOutcome, RuleUpdater};
use super::tracker::{markdown_files, EvolutionTracker};
use super::trends::{analyze_trends, QualityTrend};
use crate::config::ScrivenerConfig;
use crate::error::{Result, ScrivenerError};
use crate::evaluation::ArticleEvaluator;
use crate::storage::{run_blocking, write_atomic, Stores};
use crate::types::{jst_now, EvaluationRecord, RuleEvaluation};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Contents of `improvement_report_<YYYYmmdd_HHMMSS>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementReport {
    pub timestamp: DateTime<FixedOffset>,
    pub articles_evaluated: usize,
    pub average_score: f64,
    pub rules_updated: bool,
    pub rule_evaluation: RuleEvaluation,
    pub recent_evaluations: Vec<EvaluationRecord>,
    pub improvement_trends: QualityTrend,
}

/// Everything a cycle produced
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub report: ImprovementReport,
    pub report_path: PathBuf,
    pub lifecycle: RuleLifecycle,
    pub rule_update: Option<RuleUpdateOutcome>,
    /// Articles that could not be evaluated
    pub skipped: Vec<PathBuf>,
}

pub struct ImprovementCycle {
    config: ScrivenerConfig,
    stores: Stores,
    evaluator: Arc<ArticleEvaluator>,
}

impl ImprovementCycle {
    pub fn new(config: ScrivenerConfig) -> Self {
        let stores = Stores::from_paths(&config.paths);
        let evaluator = Arc::new(ArticleEvaluator::new(config.scoring.clone()));
        Self {
            config,
            stores,
            evaluator,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Newest `limit` posts by modification time
    pub fn recent_articles(&self, limit: usize) -> Result<Vec<PathBuf>> {
        recent_articles(&self.config.paths.posts_dir, limit)
    }

    /// Evaluate `paths` concurrently, preserving input order. Failures are
    /// logged and returned separately.
    pub async fn evaluate_batch(
        &self,
        paths: Vec<PathBuf>,
    ) -> (Vec<EvaluationRecord>, Vec<PathBuf>) {
        let mut tasks = JoinSet::new();
        for (index, path) in paths.iter().cloned().enumerate() {
            let evaluator = Arc::clone(&self.evaluator);
            tasks.spawn_blocking(move || (index, evaluator.evaluate_file(&path)));
        }

        let mut slots: Vec<Option<EvaluationRecord>> = vec![None; paths.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(record))) => slots[index] = Some(record),
                Ok((index, Err(e))) => warn!("Skipping {}: {}", paths[index].display(), e),
                Err(e) => warn!("Evaluation task failed: {}", e),
            }
        }

        let mut records = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();
        for (slot, path) in slots.into_iter().zip(paths) {
            match slot {
                Some(record) => records.push(record),
                None => skipped.push(path),
            }
        }
        (records, skipped)
    }

    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let cycle = &self.config.cycle;
        let mut lifecycle = RuleLifecycle::Idle;

        let articles = self.recent_articles(cycle.recent_articles)?;
        info!("Evaluating {} recent article(s)", articles.len());
        let (evaluations, skipped) = self.evaluate_batch(articles).await;

        let appended = evaluations.clone();
        self.stores
            .evaluations
            .update_blocking(move |history| history.evaluations.extend(appended))
            .await?;

        let rule_evaluation =
            RuleEvaluator::new(self.config.rules.clone()).evaluate(&evaluations);
        lifecycle = advance(lifecycle, RuleLifecycle::Evaluated);

        let updater = RuleUpdater::new(
            &self.config.paths.rules_document,
            self.stores.rules.clone(),
            self.config.rules.anchors.clone(),
        );
        let submitted = rule_evaluation.clone();
        let rule_update = match run_blocking(move || updater.update(&submitted)).await {
            Ok(outcome) => outcome,
            Err(ScrivenerError::NotFound(path)) => {
                warn!("Rules document {} not found, skipping update", path.display());
                None
            }
            Err(e) => return Err(e),
        };
        lifecycle = advance(
            lifecycle,
            if rule_update.is_some() {
                RuleLifecycle::Updated
            } else {
                RuleLifecycle::NoUpdate
            },
        );

        let now = jst_now();
        let new_version = rule_update.as_ref().map(|u| u.version.clone());
        let trend_window = cycle.trend_window;
        let (history, trend) = self
            .stores
            .evaluations
            .update_blocking(move |history| {
                history.rule_updates.extend(new_version);
                let trend = analyze_trends(&history.evaluations, trend_window);
                history
                    .quality_trends
                    .insert(now.format("%Y-%m-%d").to_string(), trend.clone());
                trend
            })
            .await?;
        debug!(
            "History now holds {} evaluations, trend {}",
            history.evaluations.len(),
            trend.label()
        );

        let average_score = if evaluations.is_empty() {
            0.0
        } else {
            evaluations.iter().map(|e| e.total_score).sum::<f64>() / evaluations.len() as f64
        };
        let start = evaluations.len().saturating_sub(cycle.report_evaluations);

        let report = ImprovementReport {
            timestamp: now,
            articles_evaluated: evaluations.len(),
            average_score,
            rules_updated: rule_update.is_some(),
            rule_evaluation,
            recent_evaluations: evaluations[start..].to_vec(),
            improvement_trends: trend,
        };

        let report_path = self.config.paths.reports_dir.join(format!(
            "improvement_report_{}.json",
            now.format("%Y%m%d_%H%M%S")
        ));
        let json = serde_json::to_string_pretty(&report)?;
        let target = report_path.clone();
        run_blocking(move || write_atomic(&target, json.as_bytes())).await?;
        info!(
            "Cycle complete: {} evaluated, average {:.1}, rules {:?}",
            report.articles_evaluated, report.average_score, lifecycle
        );

        Ok(CycleOutcome {
            report,
            report_path,
            lifecycle,
            rule_update,
            skipped,
        })
    }
}

fn advance(from: RuleLifecycle, to: RuleLifecycle) -> RuleLifecycle {
    debug!("Rule lifecycle {:?} -> {:?}", from, to);
    to
}

/// Newest `limit` `*.md` files in `dir` by modification time. A missing
/// directory yields no articles.
pub fn recent_articles(dir: &Path, limit: usize) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        warn!("Posts directory {} not found", dir.display());
        return Ok(Vec::new());
    }

    let mut dated: Vec<(SystemTime, PathBuf)> = markdown_files(dir)?
        .into_iter()
        .map(|path| {
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(dated.into_iter().take(limit).map(|(_, p)| p).collect())
}

#[async_trait]
impl PipelineJob for ImprovementCycle {
    fn name(&self) -> &str {
        "improvement-cycle"
    }

    async fn run(&self) -> Result<JobReport> {
        let outcome = self.run_cycle().await?;
        let mut outputs = vec![outcome.report_path];
        if outcome.rule_update.is_some() {
            outputs.push(self.config.paths.rules_document.clone());
        }
        Ok(JobReport {
            items_processed: outcome.report.articles_evaluated,
            changes_made: usize::from(outcome.report.rules_updated),
            errors: outcome.skipped.len(),
            outputs,
            ..JobReport::default()
        })
    }
}

#[async_trait]
impl PipelineJob for EvolutionTracker {
    fn name(&self) -> &str {
        "evolution-report"
    }

    async fn run(&self) -> Result<JobReport> {
        let tracker = self.clone();
        let report = run_blocking(move || tracker.generate_report()).await?;
        Ok(JobReport {
            items_processed: report
                .analysis
                .evaluation_analysis
                .as_ref()
                .map(|e| e.total_evaluations)
                .unwrap_or(0),
            changes_made: 1,
            outputs: vec![report.path],
            ..JobReport::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_recent_articles_newest_first() {
        let dir = TempDir::new().unwrap();
        for (i, name) in ["a.md", "b.md", "c.md"].iter().enumerate() {
            let path = dir.path().join(name);
            std::fs::write(&path, "x").unwrap();
            let file = std::fs::File::options().write(true).open(&path).unwrap();
            file.set_modified(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1000 * (i as u64 + 1)))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let recent = recent_articles(dir.path(), 2).unwrap();
        let names: Vec<_> = recent
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["c.md", "b.md"]);
    }

    #[test]
    fn test_missing_posts_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(recent_articles(&dir.path().join("posts"), 5).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_skips_failures() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.md");
        let b = dir.path().join("b.md");
        std::fs::write(&a, "---\ntitle: A\n---\n").unwrap();
        std::fs::write(&b, "---\ntitle: B\n---\n").unwrap();

        let cycle = ImprovementCycle::new(ScrivenerConfig::default());
        let (records, skipped) = cycle
            .evaluate_batch(vec![b.clone(), dir.path().join("gone.md"), a.clone()])
            .await;

        let titles: Vec<_> = records.iter().map(|r| r.title().to_string()).collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert_eq!(skipped, vec![dir.path().join("gone.md")]);
    }
}
