//! Error types for the Scrivener scoring pipeline
//!
//! This module provides structured error definitions using thiserror. Callers
//! match on the kind to decide whether to retry, skip or abort.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Scrivener operations
#[derive(Error, Debug)]
pub enum ScrivenerError {
    /// A JSON store or document could not be parsed
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A required input file does not exist
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// Another process holds the lock on a store or document
    #[error("Resource is locked by another writer: {0}")]
    Locked(PathBuf),

    /// URL probe exceeded its request timeout
    #[error("Network timeout while checking {0}")]
    NetworkTimeout(String),

    /// URL probe failed for a reason other than a timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Version string does not follow `major.minor`
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (in-memory values, not file contents)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl ScrivenerError {
    /// Build a parse error for the file at `path`
    pub fn parse(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        ScrivenerError::Parse {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for Scrivener operations
pub type Result<T> = std::result::Result<T, ScrivenerError>;
