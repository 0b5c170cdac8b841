//! Pipeline configuration
//!
//! Every threshold, marker and file location the pipeline uses lives here so
//! that scoring weights and document anchors are data rather than literals.
//! `ScrivenerConfig::default()` reproduces the house style checklist the blog
//! was originally tuned against.

use crate::evaluation::scoring::ScoringTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrivenerConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub cycle: CycleConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub proofreading: ProofreadingConfig,
}

/// File locations, relative to the working directory unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub posts_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub evaluation_history: PathBuf,
    pub rules_document: PathBuf,
    pub rules_history: PathBuf,
    pub proofreading_rules_document: PathBuf,
    pub proofreading_rules_history: PathBuf,
    pub proofreading_log: PathBuf,
    pub evolution_history: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("posts"),
            reports_dir: PathBuf::from("."),
            evaluation_history: PathBuf::from("evaluation_history.json"),
            rules_document: PathBuf::from("BLOG_WRITING_RULES.md"),
            rules_history: PathBuf::from("rules_history.json"),
            proofreading_rules_document: PathBuf::from("BLOG_PROOFREADING_RULES.md"),
            proofreading_rules_history: PathBuf::from("proofreading_rules_history.json"),
            proofreading_log: PathBuf::from("proofreading_log.json"),
            evolution_history: PathBuf::from("evolution_history.json"),
        }
    }
}

impl PathsConfig {
    /// Re-root every relative path under `base`
    pub fn rooted_at(&self, base: &Path) -> Self {
        let root = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            posts_dir: root(&self.posts_dir),
            reports_dir: root(&self.reports_dir),
            evaluation_history: root(&self.evaluation_history),
            rules_document: root(&self.rules_document),
            rules_history: root(&self.rules_history),
            proofreading_rules_document: root(&self.proofreading_rules_document),
            proofreading_rules_history: root(&self.proofreading_rules_history),
            proofreading_log: root(&self.proofreading_log),
            evolution_history: root(&self.evolution_history),
        }
    }
}

/// Improvement-cycle sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Most recently modified posts evaluated per run
    pub recent_articles: usize,

    /// Evaluations compared per side when computing the quality trend
    pub trend_window: usize,

    /// Evaluations included in the improvement report
    pub report_evaluations: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            recent_articles: 5,
            trend_window: 10,
            report_evaluations: 3,
        }
    }
}

/// Scorer deductions plus the strengths/weaknesses analyzer thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub table: ScoringTable,

    /// A dimension at or above this score is a strength
    pub strength_threshold: f64,

    /// A dimension below this score is a weakness
    pub weakness_threshold: f64,

    /// More fence lines than this count as rich code coverage
    pub rich_code_fences: usize,

    /// Inclusive band for code blocks per blank-line separated paragraph
    pub code_balance_min: f64,
    pub code_balance_max: f64,

    /// Heading that marks the thought-process section
    pub thought_process_marker: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            table: ScoringTable::default(),
            strength_threshold: 20.0,
            weakness_threshold: 15.0,
            rich_code_fences: 5,
            code_balance_min: 0.2,
            code_balance_max: 0.4,
            thought_process_marker: "なぜこの記事を書こうと思ったのか".to_string(),
        }
    }
}

/// Rule evaluator thresholds and rules-document anchors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Readability mean below this proposes a high-priority update
    pub readability_floor: f64,

    /// Originality mean below this proposes a medium-priority update
    pub originality_floor: f64,

    /// A weakness seen this many times in a batch proposes a checklist rule
    pub recurring_weakness_min: usize,

    pub anchors: DocumentAnchors,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            readability_floor: 18.0,
            originality_floor: 18.0,
            recurring_weakness_min: 3,
            anchors: DocumentAnchors::default(),
        }
    }
}

/// Literal markers located in a rules document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentAnchors {
    /// Heading prefix preceding `<major>.<minor>`
    pub version_heading_prefix: String,

    /// New update sections are inserted before this heading
    pub insertion_heading: String,

    /// Label of the `*<label>: <version>*` field
    pub version_field_label: String,
}

impl Default for DocumentAnchors {
    fn default() -> Self {
        Self {
            version_heading_prefix: "### v".to_string(),
            insertion_heading: "### 今後の更新予定".to_string(),
            version_field_label: "バージョン".to_string(),
        }
    }
}

/// Proofreader knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofreadingConfig {
    /// Issue HEAD requests instead of the format-only URL check
    pub probe_urls: bool,

    /// Per-request timeout for URL probes, in seconds
    pub url_timeout_secs: u64,

    /// Only the first N URLs of an article are checked
    pub max_urls: usize,

    /// Sentences longer than this (in characters) are flagged
    pub long_sentence_chars: usize,

    /// More passive-voice endings than this are flagged
    pub passive_voice_limit: usize,

    /// `最新` claims older than this many days are flagged
    pub stale_latest_days: i64,

    /// Years older than current minus this are flagged
    pub outdated_year_span: i32,

    /// Log entries considered when evaluating proofreading rules
    pub rule_window: usize,

    /// An issue type seen this many times proposes a rule change
    pub recurring_issue_min: usize,
}

impl Default for ProofreadingConfig {
    fn default() -> Self {
        Self {
            probe_urls: false,
            url_timeout_secs: 10,
            max_urls: 5,
            long_sentence_chars: 100,
            passive_voice_limit: 20,
            stale_latest_days: 30,
            outdated_year_span: 2,
            rule_window: 10,
            recurring_issue_min: 3,
        }
    }
}

impl ScrivenerConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ScrivenerConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle.recent_articles == 0 {
            return Err(ConfigError::ValidationError(
                "cycle.recent_articles must be at least 1".to_string(),
            ));
        }

        if self.cycle.trend_window == 0 {
            return Err(ConfigError::ValidationError(
                "cycle.trend_window must be at least 1".to_string(),
            ));
        }

        let scoring = &self.scoring;
        if scoring.weakness_threshold > scoring.strength_threshold {
            return Err(ConfigError::ValidationError(
                "scoring.weakness_threshold must not exceed scoring.strength_threshold"
                    .to_string(),
            ));
        }

        if scoring.code_balance_min > scoring.code_balance_max {
            return Err(ConfigError::ValidationError(
                "scoring.code_balance_min must not exceed scoring.code_balance_max".to_string(),
            ));
        }

        scoring
            .table
            .validate()
            .map_err(ConfigError::ValidationError)?;

        if self.rules.recurring_weakness_min == 0 {
            return Err(ConfigError::ValidationError(
                "rules.recurring_weakness_min must be at least 1".to_string(),
            ));
        }

        let anchors = &self.rules.anchors;
        if anchors.version_heading_prefix.trim().is_empty()
            || anchors.insertion_heading.trim().is_empty()
            || anchors.version_field_label.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "rules.anchors entries must not be empty".to_string(),
            ));
        }

        let proof = &self.proofreading;
        if proof.url_timeout_secs == 0 || proof.url_timeout_secs > 120 {
            return Err(ConfigError::ValidationError(
                "proofreading.url_timeout_secs must be between 1 and 120".to_string(),
            ));
        }

        if proof.rule_window == 0 || proof.recurring_issue_min == 0 {
            return Err(ConfigError::ValidationError(
                "proofreading.rule_window and recurring_issue_min must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
