// Evolution Module - Feedback loop from evaluations back into the rules
//
// Components:
// - rule_evaluator: Suggested rule changes from a batch of evaluations
// - rules_document: Line model of a versioned rules document
// - rule_updater: Conditional rules-document rewrite plus history entry
// - trends: Recent vs historical quality comparison
// - tracker: Long-run statistics, grade and Markdown report
// - cycle: The end-to-end improvement pass
// - job: Common runnable shape for the pipeline stages

pub mod cycle;
pub mod job;
pub mod rule_evaluator;
pub mod rule_updater;
pub mod rules_document;
pub mod tracker;
pub mod trends;

pub use cycle::{CycleOutcome, ImprovementCycle, ImprovementReport};
pub use job::{run_job, JobReport, PipelineJob};
pub use rule_evaluator::RuleEvaluator;
pub use rule_updater::{RuleLifecycle, RuleUpdateOutcome, RuleUpdater};
pub use rules_document::RulesDocument;
pub use tracker::{EvolutionAnalysis, EvolutionReport, EvolutionTracker, OverallScore};
pub use trends::{analyze_trends, QualityTrend, TrendFigures};
