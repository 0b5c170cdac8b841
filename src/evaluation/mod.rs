//! Heuristic article evaluation
//!
//! Raw article text flows through four stages:
//!
//! - **metadata**: `---` front-matter extraction
//! - **predicates**: named lexical checks over the text
//! - **scoring**: a deduction table applied per dimension, each dimension in `[0, 25]`
//! - **analyzer**: strengths, weaknesses and suggestions derived from the scores
//!
//! [`ArticleEvaluator`] runs all of them and produces an
//! [`EvaluationRecord`](crate::types::EvaluationRecord).
//!
//! # Usage
//!
//! ```rust
//! use scrivener_core::evaluation::ArticleEvaluator;
//!
//! let evaluator = ArticleEvaluator::default();
//! let record = evaluator.evaluate_text("posts/test.md", "---\ntitle: Test\n---\nbody");
//! assert!(record.total_score <= 100.0);
//! ```

pub mod analyzer;
pub mod evaluator;
pub mod metadata;
pub mod predicates;
pub mod scoring;

pub use analyzer::{Analysis, Analyzer};
pub use evaluator::ArticleEvaluator;
pub use metadata::{extract_metadata, render_front_matter, strip_front_matter};
pub use scoring::{score_article, Check, Deduction, FiredDeduction, Scorer, ScoringTable};
