//! Proofreading rule manager
//!
//! Looks at the recent proofreading log, proposes rule changes for issue
//! types that keep coming back and, for high-priority ones, rewrites the
//! proofreading rules document through the shared [`RuleUpdater`].

use super::issues::{IssueType, ProofreadingResult};
use crate::config::ScrivenerConfig;
use crate::error::{Result, ScrivenerError};
use crate::evolution::{RuleUpdateOutcome, RuleUpdater};
use crate::storage::Stores;
use crate::types::{jst_now, Priority, RuleEvaluation, SuggestedUpdate};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofreadingRuleEvaluation {
    pub timestamp: DateTime<FixedOffset>,
    /// Mean final score over the window
    pub effectiveness: f64,
    pub common_issues: BTreeMap<String, usize>,
    pub suggested_updates: Vec<SuggestedUpdate>,
    pub rationale: Vec<String>,
}

impl ProofreadingRuleEvaluation {
    /// View as a generic rule evaluation for the document updater
    pub fn to_rule_evaluation(&self) -> RuleEvaluation {
        RuleEvaluation {
            timestamp: self.timestamp,
            current_effectiveness: self.effectiveness,
            suggested_updates: self.suggested_updates.clone(),
            rationale: self.rationale.clone(),
        }
    }
}

/// Suggested change for a recurring issue type, if any
pub fn suggestion_for(issue_type: IssueType) -> Option<SuggestedUpdate> {
    match issue_type {
        IssueType::VersionOutdated => Some(SuggestedUpdate::new(
            "バージョン情報の自動更新強化",
            "最新バージョン情報の取得方法を改善",
            Priority::High,
        )),
        IssueType::MissingTermExplanation => Some(SuggestedUpdate::new(
            "専門用語の説明チェック強化",
            "用語集を作成し、自動的に説明を挿入",
            Priority::Medium,
        )),
        IssueType::Typo => Some(SuggestedUpdate::new(
            "誤字脱字パターンの拡充",
            "よくある誤字パターンをルールに追加",
            Priority::Low,
        )),
        _ => None,
    }
}

#[derive(Debug)]
pub struct ProofreadingRuleManager {
    window: usize,
    recurring_min: usize,
    updater: RuleUpdater,
}

impl ProofreadingRuleManager {
    pub fn new(config: &ScrivenerConfig, stores: &Stores) -> Self {
        Self {
            window: config.proofreading.rule_window,
            recurring_min: config.proofreading.recurring_issue_min,
            updater: RuleUpdater::new(
                &config.paths.proofreading_rules_document,
                stores.proofreading_rules.clone(),
                config.rules.anchors.clone(),
            ),
        }
    }

    /// Evaluate the last `window` results of `logs`
    pub fn evaluate(&self, logs: &[ProofreadingResult]) -> ProofreadingRuleEvaluation {
        let recent = &logs[logs.len().saturating_sub(self.window)..];

        let effectiveness = if recent.is_empty() {
            0.0
        } else {
            recent.iter().map(|r| r.final_score as f64).sum::<f64>() / recent.len() as f64
        };

        // First-seen order drives suggestion order
        let mut tally: Vec<(IssueType, usize)> = Vec::new();
        for issue in recent.iter().flat_map(|r| &r.issues_found) {
            match tally.iter_mut().find(|(t, _)| *t == issue.issue_type) {
                Some((_, count)) => *count += 1,
                None => tally.push((issue.issue_type, 1)),
            }
        }

        let mut suggested_updates = Vec::new();
        let mut rationale = Vec::new();
        for (issue_type, count) in &tally {
            if *count < self.recurring_min {
                continue;
            }
            if let Some(update) = suggestion_for(*issue_type) {
                suggested_updates.push(update);
                rationale.push(format!("{}が{}回発生", issue_type, count));
            }
        }

        ProofreadingRuleEvaluation {
            timestamp: jst_now(),
            effectiveness,
            common_issues: tally
                .into_iter()
                .map(|(t, c)| (t.as_str().to_string(), c))
                .collect(),
            suggested_updates,
            rationale,
        }
    }

    /// Rewrite the proofreading rules document for high-priority suggestions.
    /// A missing document is logged and treated as no update.
    pub fn apply(
        &self,
        evaluation: &ProofreadingRuleEvaluation,
    ) -> Result<Option<RuleUpdateOutcome>> {
        match self.updater.update(&evaluation.to_rule_evaluation()) {
            Ok(Some(outcome)) => {
                info!(
                    "Proofreading rules updated to v{}",
                    outcome.version.version
                );
                Ok(Some(outcome))
            }
            Ok(None) => Ok(None),
            Err(ScrivenerError::NotFound(path)) => {
                warn!(
                    "Proofreading rules document {} not found, skipping update",
                    path.display()
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
