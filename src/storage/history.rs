//! History documents
//!
//! Field names match the JSON files the pipeline has always written, and all
//! fields default so older or hand-edited files still load.

use crate::config::PathsConfig;
use crate::evolution::tracker::OverallScore;
use crate::evolution::trends::QualityTrend;
use crate::proofreading::ProofreadingResult;
use crate::storage::json_store::JsonStore;
use crate::types::{EvaluationRecord, RuleVersion, SuggestedUpdate};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `evaluation_history.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationHistory {
    pub evaluations: Vec<EvaluationRecord>,
    pub rule_updates: Vec<RuleVersion>,
    /// Keyed by run date, `YYYY-MM-DD`
    pub quality_trends: BTreeMap<String, QualityTrend>,
}

impl EvaluationHistory {
    /// The last `n` evaluations, oldest first
    pub fn recent(&self, n: usize) -> &[EvaluationRecord] {
        let start = self.evaluations.len().saturating_sub(n);
        &self.evaluations[start..]
    }
}

/// `rules_history.json` and `proofreading_rules_history.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesHistory {
    pub versions: Vec<RuleVersion>,
    pub update_reasons: Vec<String>,
}

impl RulesHistory {
    pub fn latest(&self) -> Option<&RuleVersion> {
        self.versions.last()
    }
}

/// `proofreading_log.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofreadingLog {
    pub logs: Vec<ProofreadingResult>,
    /// Running count per issue type across every logged run
    pub common_issues: BTreeMap<String, usize>,
    pub improvement_patterns: Vec<SuggestedUpdate>,
}

impl ProofreadingLog {
    /// Append a result and fold its issues into `common_issues`
    pub fn record(&mut self, result: ProofreadingResult) {
        for issue in &result.issues_found {
            *self
                .common_issues
                .entry(issue.issue_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        self.logs.push(result);
    }

    pub fn recent(&self, n: usize) -> &[ProofreadingResult] {
        let start = self.logs.len().saturating_sub(n);
        &self.logs[start..]
    }

    /// Remember suggestions not seen before
    pub fn remember_patterns(&mut self, suggestions: &[SuggestedUpdate]) {
        for suggestion in suggestions {
            if !self.improvement_patterns.contains(suggestion) {
                self.improvement_patterns.push(suggestion.clone());
            }
        }
    }
}

/// One recorded tracker run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSession {
    pub session_id: String,
    pub timestamp: DateTime<FixedOffset>,
    /// Full analysis snapshot; kept untyped so older sessions still load
    pub analysis: serde_json::Value,
    #[serde(default)]
    pub improvements_implemented: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// A grade change worth remembering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub date: String,
    pub description: String,
}

/// `evolution_history.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionLog {
    pub evolution_sessions: Vec<EvolutionSession>,
    /// Rule-update pattern counts as of the latest session
    pub improvement_patterns: BTreeMap<String, usize>,
    /// Overall score keyed by session date
    pub metrics_over_time: BTreeMap<String, OverallScore>,
    pub system_milestones: Vec<Milestone>,
}

/// Handles to every history document
#[derive(Debug, Clone)]
pub struct Stores {
    pub evaluations: JsonStore<EvaluationHistory>,
    pub rules: JsonStore<RulesHistory>,
    pub proofreading_rules: JsonStore<RulesHistory>,
    pub proofreading_log: JsonStore<ProofreadingLog>,
    pub evolution: JsonStore<EvolutionLog>,
}

impl Stores {
    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self {
            evaluations: JsonStore::new(&paths.evaluation_history),
            rules: JsonStore::new(&paths.rules_history),
            proofreading_rules: JsonStore::new(&paths.proofreading_rules_history),
            proofreading_log: JsonStore::new(&paths.proofreading_log),
            evolution: JsonStore::new(&paths.evolution_history),
        }
    }
}
