//! Proofreading records
//!
//! These serialize to the entries of `proofreading_log.json`.

use crate::proofreading::urls::UrlCheckError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    VersionOutdated,
    DeprecatedUsage,
    ImportOrder,
    UnusedVariable,
    InvalidUrl,
    OutdatedReference,
    StaleLatestClaim,
    Typo,
    LongSentence,
    ExcessivePassiveVoice,
    MissingTermExplanation,
    InsufficientCodeExamples,
    MissingInstallationGuide,
    MissingErrorHandling,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::VersionOutdated => "version_outdated",
            IssueType::DeprecatedUsage => "deprecated_usage",
            IssueType::ImportOrder => "import_order",
            IssueType::UnusedVariable => "unused_variable",
            IssueType::InvalidUrl => "invalid_url",
            IssueType::OutdatedReference => "outdated_reference",
            IssueType::StaleLatestClaim => "stale_latest_claim",
            IssueType::Typo => "typo",
            IssueType::LongSentence => "long_sentence",
            IssueType::ExcessivePassiveVoice => "excessive_passive_voice",
            IssueType::MissingTermExplanation => "missing_term_explanation",
            IssueType::InsufficientCodeExamples => "insufficient_code_examples",
            IssueType::MissingInstallationGuide => "missing_installation_guide",
            IssueType::MissingErrorHandling => "missing_error_handling",
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Points deducted from the starting score of 100
    pub fn penalty(&self) -> i32 {
        match self {
            Severity::High => 10,
            Severity::Medium => 5,
            Severity::Low => 2,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub location: String,
    pub original: String,
    pub suggestion: String,
    #[serde(default)]
    pub auto_correctable: bool,
    /// Literal text to replace when auto-correcting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_error: Option<UrlCheckError>,
}

impl Issue {
    pub fn new(
        issue_type: IssueType,
        severity: Severity,
        location: impl Into<String>,
        original: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            severity,
            location: location.into(),
            original: original.into(),
            suggestion: suggestion.into(),
            auto_correctable: false,
            pattern: None,
            replacement: None,
            url_error: None,
        }
    }

    /// Mark as fixable by replacing `pattern` with `replacement`
    pub fn correctable(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.auto_correctable = true;
        self.pattern = Some(pattern.into());
        self.replacement = Some(replacement.into());
        self
    }
}

/// An applied auto-correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub original: String,
    pub corrected: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofreadingResult {
    pub article_id: String,
    pub timestamp: DateTime<FixedOffset>,
    /// 100 minus severity penalties; may go negative
    pub original_score: i32,
    pub issues_found: Vec<Issue>,
    #[serde(default)]
    pub corrections: Vec<Correction>,
    /// `min(100, original_score + 3 × corrections)`
    pub final_score: i32,
    #[serde(default)]
    pub auto_corrected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_content: Option<String>,
}
