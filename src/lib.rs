//! Scrivener - Self-improving quality pipeline for a technical blog
//!
//! Scores Markdown articles on four dimensions, feeds recurring weaknesses
//! back into a versioned writing-rules document, proofreads articles with
//! optional auto-correction, and tracks quality over time.
//!
//! # Architecture
//!
//! - **Evaluation**: Deterministic text predicates and a weighted deduction
//!   table producing per-dimension scores
//! - **Evolution**: Rule evaluation, rules-document updates, quality trends,
//!   the improvement cycle and the long-run evolution tracker
//! - **Proofreading**: Issue detection, auto-correction and proofreading-rule
//!   feedback
//! - **Storage**: JSON history files with locked, atomic read-modify-write
//!
//! # Example
//!
//! ```no_run
//! use scrivener_core::{evolution::ImprovementCycle, ScrivenerConfig};
//!
//! #[tokio::main]
//! async fn main() -> scrivener_core::Result<()> {
//!     let config = ScrivenerConfig::default();
//!     let outcome = ImprovementCycle::new(config).run_cycle().await?;
//!     println!("average {:.1}", outcome.report.average_score);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod evaluation;
pub mod evolution;
pub mod proofreading;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::{ConfigError, ScrivenerConfig};
pub use error::{Result, ScrivenerError};
pub use evaluation::ArticleEvaluator;
pub use types::{
    ArticleMetadata, Dimension, EvaluationRecord, Priority, RuleEvaluation, RuleVersion,
    RuleVersionNumber, ScoreSet, SuggestedUpdate,
};
