//! Storage layer for Scrivener
//!
//! Provides the JSON-file stores that persist evaluation, rule, proofreading
//! and evolution histories between runs.

pub mod history;
pub mod json_store;

pub use history::{
    EvaluationHistory, EvolutionLog, EvolutionSession, Milestone, ProofreadingLog, RulesHistory,
    Stores,
};
pub use json_store::{run_blocking, write_atomic, FileLock, JsonStore};
