//! One proofreading pass over a single post: proofread, optionally write the
//! corrections back, append to the log and re-evaluate the proofreading rules.

use super::issues::ProofreadingResult;
use super::proofreader::Proofreader;
use super::rules::{ProofreadingRuleEvaluation, ProofreadingRuleManager};
use crate::config::ScrivenerConfig;
use crate::error::Result;
use crate::evolution::{JobReport, PipelineJob, RuleUpdateOutcome};
use crate::storage::{run_blocking, write_atomic, Stores};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub result: ProofreadingResult,
    /// Whether corrected content was written back to the post
    pub applied: bool,
    pub rule_evaluation: ProofreadingRuleEvaluation,
    pub rule_update: Option<RuleUpdateOutcome>,
}

pub struct ProofreadingPass {
    article: PathBuf,
    apply: bool,
    proofreader: Proofreader,
    rules: Arc<ProofreadingRuleManager>,
    stores: Stores,
}

impl ProofreadingPass {
    pub fn new(config: &ScrivenerConfig, article: impl Into<PathBuf>, apply: bool) -> Result<Self> {
        let stores = Stores::from_paths(&config.paths);
        Ok(Self {
            article: article.into(),
            apply,
            proofreader: Proofreader::new(config.proofreading.clone())?,
            rules: Arc::new(ProofreadingRuleManager::new(config, &stores)),
            stores,
        })
    }

    pub fn article(&self) -> &Path {
        &self.article
    }

    pub async fn execute(&self) -> Result<PassOutcome> {
        let result = self.proofreader.proofread_file(&self.article).await?;

        let applied = match (&result.corrected_content, self.apply) {
            (Some(content), true) => {
                let target = self.article.clone();
                let content = content.clone();
                run_blocking(move || write_atomic(&target, content.as_bytes())).await?;
                info!(
                    "Applied {} correction(s) to {}",
                    result.corrections.len(),
                    self.article.display()
                );
                true
            }
            _ => false,
        };

        let window = self.proofreader.config().rule_window;
        let rules = Arc::clone(&self.rules);
        let logged = result.clone();
        let (_, rule_evaluation) = self
            .stores
            .proofreading_log
            .update_blocking(move |log| {
                log.record(logged);
                let evaluation = rules.evaluate(log.recent(window));
                log.remember_patterns(&evaluation.suggested_updates);
                evaluation
            })
            .await?;

        let rules = Arc::clone(&self.rules);
        let submitted = rule_evaluation.clone();
        let rule_update = run_blocking(move || rules.apply(&submitted)).await?;

        Ok(PassOutcome {
            result,
            applied,
            rule_evaluation,
            rule_update,
        })
    }
}

#[async_trait]
impl PipelineJob for ProofreadingPass {
    fn name(&self) -> &str {
        "proofreading-pass"
    }

    async fn run(&self) -> Result<JobReport> {
        let outcome = self.execute().await?;
        let mut outputs = vec![self.stores.proofreading_log.path().to_path_buf()];
        if outcome.applied {
            outputs.push(self.article.clone());
        }
        Ok(JobReport {
            items_processed: 1,
            changes_made: usize::from(outcome.applied) + usize::from(outcome.rule_update.is_some()),
            outputs,
            ..JobReport::default()
        })
    }
}
