//! Core data types for the Scrivener pipeline
//!
//! This module defines the records that flow through the pipeline: article
//! metadata, per-dimension scores, evaluation records, rule evaluations and
//! rule versions. Every record serializes to the JSON shape used by the
//! history files so existing histories remain readable.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Maximum score for a single dimension
pub const DIMENSION_MAX: f64 = 25.0;

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// UTC+9, the fixed offset used for every timestamp the pipeline writes
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current time in UTC+9
pub fn jst_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}

/// Front-matter key/value pairs
///
/// Keys are free-form. Missing keys default at the call site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleMetadata(pub BTreeMap<String, String>);

impl ArticleMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or `default` when absent
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

/// Quality dimension scored independently out of 25
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    TechnicalAccuracy,
    Readability,
    Practicality,
    Originality,
}

impl Dimension {
    /// All dimensions in reporting order
    pub const ALL: [Dimension; 4] = [
        Dimension::TechnicalAccuracy,
        Dimension::Readability,
        Dimension::Practicality,
        Dimension::Originality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::TechnicalAccuracy => "technical_accuracy",
            Dimension::Readability => "readability",
            Dimension::Practicality => "practicality",
            Dimension::Originality => "originality",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technical_accuracy" => Ok(Dimension::TechnicalAccuracy),
            "readability" => Ok(Dimension::Readability),
            "practicality" => Ok(Dimension::Practicality),
            "originality" => Ok(Dimension::Originality),
            _ => Err(format!("Unknown dimension: {}", s)),
        }
    }
}

/// Scores for the four dimensions, each in [0, 25]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub technical_accuracy: f64,
    pub readability: f64,
    pub practicality: f64,
    pub originality: f64,
}

impl ScoreSet {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::TechnicalAccuracy => self.technical_accuracy,
            Dimension::Readability => self.readability,
            Dimension::Practicality => self.practicality,
            Dimension::Originality => self.originality,
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) {
        match dimension {
            Dimension::TechnicalAccuracy => self.technical_accuracy = value,
            Dimension::Readability => self.readability = value,
            Dimension::Practicality => self.practicality = value,
            Dimension::Originality => self.originality = value,
        }
    }

    /// Sum of the four dimensions, in [0, 100]
    pub fn total(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.get(*d)).sum()
    }

    /// (dimension, score) pairs in reporting order
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.iter().map(move |d| (*d, self.get(*d)))
    }
}

/// One evaluation of one article. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// File path or stem identifying the article
    pub article_path: String,
    pub timestamp: DateTime<FixedOffset>,
    pub metadata: ArticleMetadata,
    pub scores: ScoreSet,
    pub total_score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
}

impl EvaluationRecord {
    /// Title from front matter, empty when absent
    pub fn title(&self) -> &str {
        self.metadata.get_or("title", "")
    }

    /// File stem of the article path
    pub fn article_stem(&self) -> String {
        Path::new(&self.article_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.article_path.clone())
    }
}

/// Priority of a suggested rule change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// A proposed change to a rules document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedUpdate {
    pub rule: String,
    pub action: String,
    pub priority: Priority,
}

impl SuggestedUpdate {
    pub fn new(rule: impl Into<String>, action: impl Into<String>, priority: Priority) -> Self {
        Self {
            rule: rule.into(),
            action: action.into(),
            priority,
        }
    }

    pub fn is_high(&self) -> bool {
        self.priority == Priority::High
    }
}

/// Result of evaluating the rules against a recent batch of articles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub timestamp: DateTime<FixedOffset>,
    /// Sum of the per-dimension means over the batch
    pub current_effectiveness: f64,
    pub suggested_updates: Vec<SuggestedUpdate>,
    pub rationale: Vec<String>,
}

impl RuleEvaluation {
    pub fn empty() -> Self {
        Self {
            timestamp: jst_now(),
            current_effectiveness: 0.0,
            suggested_updates: Vec::new(),
            rationale: Vec::new(),
        }
    }

    /// High-priority updates, in suggestion order
    pub fn high_priority(&self) -> Vec<SuggestedUpdate> {
        self.suggested_updates
            .iter()
            .filter(|u| u.is_high())
            .cloned()
            .collect()
    }
}

/// Rules-document version, `major.minor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleVersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl RuleVersionNumber {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Version used when a document carries no version heading
    pub fn first_update() -> Self {
        Self::new(1, 1)
    }

    pub fn next_minor(&self) -> crate::error::Result<Self> {
        let minor = self
            .minor
            .checked_add(1)
            .ok_or_else(|| crate::error::ScrivenerError::InvalidVersion(self.to_string()))?;
        Ok(Self::new(self.major, minor))
    }
}

impl std::fmt::Display for RuleVersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for RuleVersionNumber {
    type Err = crate::error::ScrivenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || crate::error::ScrivenerError::InvalidVersion(s.to_string());
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        let major = major.parse().map_err(|_| invalid())?;
        let minor = minor.parse().map_err(|_| invalid())?;
        Ok(Self::new(major, minor))
    }
}

impl Serialize for RuleVersionNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RuleVersionNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One applied rules-document update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleVersion {
    pub version: RuleVersionNumber,
    /// `YYYY-MM-DD` in UTC+9
    pub date: String,
    pub updates: Vec<SuggestedUpdate>,
    #[serde(default)]
    pub rationale: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_total_is_sum() {
        let scores = ScoreSet {
            technical_accuracy: 24.0,
            readability: 17.5,
            practicality: 10.0,
            originality: 0.0,
        };
        assert_eq!(scores.total(), 51.5);
    }

    #[test]
    fn test_score_set_json_shape() {
        let scores = ScoreSet::default();
        let json = serde_json::to_value(scores).unwrap();
        for dim in Dimension::ALL {
            assert!(json.get(dim.as_str()).is_some(), "missing {}", dim);
        }
    }

    #[test]
    fn test_version_parse_and_bump() {
        let v: RuleVersionNumber = "1.3".parse().unwrap();
        assert_eq!(v.next_minor().unwrap().to_string(), "1.4");

        let v: RuleVersionNumber = "2.19".parse().unwrap();
        assert_eq!(v.next_minor().unwrap().to_string(), "2.20");

        let v = RuleVersionNumber::new(1, u32::MAX);
        assert!(matches!(
            v.next_minor(),
            Err(crate::error::ScrivenerError::InvalidVersion(_))
        ));

        assert!("1".parse::<RuleVersionNumber>().is_err());
        assert!("1.2.3".parse::<RuleVersionNumber>().is_err());
        assert!("a.b".parse::<RuleVersionNumber>().is_err());
    }

    #[test]
    fn test_version_serializes_as_string() {
        let version = RuleVersion {
            version: RuleVersionNumber::new(1, 4),
            date: "2025-07-01".to_string(),
            updates: vec![SuggestedUpdate::new("r", "a", Priority::High)],
            rationale: vec![],
        };
        let json = serde_json::to_value(&version).unwrap();
        assert_eq!(json["version"], "1.4");
        assert_eq!(json["updates"][0]["priority"], "high");
    }

    #[test]
    fn test_jst_offset() {
        let now = jst_now();
        assert_eq!(now.offset().local_minus_utc(), 9 * 3600);
        assert!(now.to_rfc3339().ends_with("+09:00"));
    }

    #[test]
    fn test_high_priority_filter() {
        let mut eval = RuleEvaluation::empty();
        eval.suggested_updates
            .push(SuggestedUpdate::new("a", "x", Priority::Medium));
        eval.suggested_updates
            .push(SuggestedUpdate::new("b", "y", Priority::High));
        let high = eval.high_priority();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].rule, "b");
    }
}
