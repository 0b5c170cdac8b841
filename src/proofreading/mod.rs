//! Article proofreading
//!
//! Checks cover technical accuracy (versions, deprecated APIs, code blocks,
//! URLs), timeliness, writing quality and practicality. Each finding costs
//! points by severity, and auto-correctable findings are applied to a copy of
//! the article. Recurring findings feed back into the proofreading rules.

pub mod checks;
pub mod issues;
pub mod pass;
pub mod proofreader;
pub mod rules;
pub mod urls;

pub use issues::{Correction, Issue, IssueType, ProofreadingResult, Severity};
pub use pass::{PassOutcome, ProofreadingPass};
pub use proofreader::{apply_corrections, score_issues, Proofreader};
pub use rules::{ProofreadingRuleEvaluation, ProofreadingRuleManager};
pub use urls::{
    HttpUrlValidator, ShallowUrlValidator, UrlCheckError, UrlValidator, UrlVerdict,
};
