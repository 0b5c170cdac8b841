// Rule Evaluator
//
// Turns a batch of evaluation records into suggested rules-document
// changes. Pure: no I/O, same input gives the same suggestions.

use crate::config::RulesConfig;
use crate::types::{
    Dimension, EvaluationRecord, Priority, RuleEvaluation, ScoreSet, SuggestedUpdate,
};
use tracing::debug;

pub const READABILITY_RULE: &str = "読みやすさの基準を強化";
pub const READABILITY_ACTION: &str = "セクション間のマージンを増やし、説明をより詳細に";
pub const READABILITY_RATIONALE: &str = "最近の記事で読みやすさスコアが低い";
pub const ORIGINALITY_RULE: &str = "独自性の要件を更新";
pub const ORIGINALITY_ACTION: &str = "複数技術の組み合わせを必須に、より深い分析を要求";
pub const ORIGINALITY_RATIONALE: &str = "独自性スコアが目標を下回っている";
pub const CHECKLIST_ACTION: &str = "明確な基準とチェックリストを追加";

pub struct RuleEvaluator {
    config: RulesConfig,
}

impl RuleEvaluator {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, records: &[EvaluationRecord]) -> RuleEvaluation {
        let mut evaluation = RuleEvaluation::empty();

        if records.is_empty() {
            return evaluation;
        }

        let means = mean_scores(records);
        evaluation.current_effectiveness = means.total();

        if means.get(Dimension::Readability) < self.config.readability_floor {
            evaluation.suggested_updates.push(SuggestedUpdate::new(
                READABILITY_RULE,
                READABILITY_ACTION,
                Priority::High,
            ));
            evaluation.rationale.push(READABILITY_RATIONALE.to_string());
        }

        if means.get(Dimension::Originality) < self.config.originality_floor {
            evaluation.suggested_updates.push(SuggestedUpdate::new(
                ORIGINALITY_RULE,
                ORIGINALITY_ACTION,
                Priority::Medium,
            ));
            evaluation.rationale.push(ORIGINALITY_RATIONALE.to_string());
        }

        for (weakness, count) in tally_weaknesses(records) {
            if count >= self.config.recurring_weakness_min {
                evaluation.suggested_updates.push(SuggestedUpdate::new(
                    format!("{}に対するルール追加", weakness),
                    CHECKLIST_ACTION,
                    Priority::High,
                ));
                evaluation
                    .rationale
                    .push(format!("{}が{}記事で発生", weakness, count));
            }
        }

        debug!(
            "Rule evaluation over {} records: effectiveness {:.1}, {} suggestions",
            records.len(),
            evaluation.current_effectiveness,
            evaluation.suggested_updates.len()
        );

        evaluation
    }
}

/// Per-dimension means over a non-empty batch
pub fn mean_scores(records: &[EvaluationRecord]) -> ScoreSet {
    let mut means = ScoreSet::default();
    if records.is_empty() {
        return means;
    }
    let n = records.len() as f64;
    for dimension in Dimension::ALL {
        let sum: f64 = records.iter().map(|r| r.scores.get(dimension)).sum();
        means.set(dimension, sum / n);
    }
    means
}

/// Weakness counts in first-seen order
pub fn tally_weaknesses(records: &[EvaluationRecord]) -> Vec<(String, usize)> {
    let mut tally: Vec<(String, usize)> = Vec::new();
    for weakness in records.iter().flat_map(|r| r.weaknesses.iter()) {
        match tally.iter_mut().find(|(w, _)| w == weakness) {
            Some((_, count)) => *count += 1,
            None => tally.push((weakness.clone(), 1)),
        }
    }
    tally
}
