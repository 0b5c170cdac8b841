//! Article proofreader
//!
//! Runs every check over an article, scores the findings and applies the
//! auto-correctable ones to a copy of the text.

use super::checks::{check_practicality, check_technical, check_timeliness, check_writing};
use super::issues::{Correction, Issue, IssueType, ProofreadingResult, Severity};
use super::urls::{extract_urls, HttpUrlValidator, ShallowUrlValidator, UrlValidator, UrlVerdict};
use crate::config::ProofreadingConfig;
use crate::error::{Result, ScrivenerError};
use crate::evaluation::extract_metadata;
use crate::types::{jst_now, ArticleMetadata};
use chrono::{DateTime, FixedOffset};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Points restored per applied correction
pub const CORRECTION_BONUS: i32 = 3;

pub struct Proofreader {
    config: ProofreadingConfig,
    validator: Arc<dyn UrlValidator>,
}

impl Proofreader {
    /// Build with the validator selected by `config.probe_urls`
    pub fn new(config: ProofreadingConfig) -> Result<Self> {
        let validator: Arc<dyn UrlValidator> = if config.probe_urls {
            Arc::new(HttpUrlValidator::new(Duration::from_secs(
                config.url_timeout_secs,
            ))?)
        } else {
            Arc::new(ShallowUrlValidator)
        };
        Ok(Self { config, validator })
    }

    pub fn with_validator(config: ProofreadingConfig, validator: Arc<dyn UrlValidator>) -> Self {
        Self { config, validator }
    }

    pub fn config(&self) -> &ProofreadingConfig {
        &self.config
    }

    /// Collect issues in check order: technical, timeliness, writing, practicality
    pub async fn find_issues(
        &self,
        text: &str,
        metadata: &ArticleMetadata,
        now: DateTime<FixedOffset>,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        check_technical(text, &mut issues);

        for url in extract_urls(text).into_iter().take(self.config.max_urls) {
            if let UrlVerdict::Invalid(reason) = self.validator.check(url).await {
                debug!("Invalid URL {}: {:?}", url, reason);
                let mut issue = Issue::new(
                    IssueType::InvalidUrl,
                    Severity::Low,
                    url,
                    url,
                    "URLの有効性を確認",
                );
                issue.url_error = Some(reason);
                issues.push(issue);
            }
        }

        check_timeliness(text, metadata, now, &self.config, &mut issues);
        check_writing(text, &self.config, &mut issues);
        check_practicality(text, &mut issues);
        issues
    }

    pub async fn proofread(
        &self,
        article_id: &str,
        text: &str,
        metadata: &ArticleMetadata,
    ) -> ProofreadingResult {
        self.proofread_at(article_id, text, metadata, jst_now()).await
    }

    /// Proofread as of `now`
    pub async fn proofread_at(
        &self,
        article_id: &str,
        text: &str,
        metadata: &ArticleMetadata,
        now: DateTime<FixedOffset>,
    ) -> ProofreadingResult {
        let issues = self.find_issues(text, metadata, now).await;
        let original_score = score_issues(&issues);
        let (corrected, corrections) = apply_corrections(text, &issues);

        let final_score = (original_score + CORRECTION_BONUS * corrections.len() as i32).min(100);
        let auto_corrected = !corrections.is_empty();

        info!(
            "Proofread {}: {} issue(s), {} correction(s), score {} -> {}",
            article_id,
            issues.len(),
            corrections.len(),
            original_score,
            final_score
        );

        ProofreadingResult {
            article_id: article_id.to_string(),
            timestamp: now,
            original_score,
            issues_found: issues,
            corrections,
            final_score,
            auto_corrected,
            corrected_content: auto_corrected.then_some(corrected),
        }
    }

    /// Proofread a post on disk; the article id is the file stem
    pub async fn proofread_file(&self, path: &Path) -> Result<ProofreadingResult> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ScrivenerError::NotFound(path.to_path_buf()),
                _ => ScrivenerError::Io(e),
            })?;
        let metadata = extract_metadata(&text);
        let article_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.proofread(&article_id, &text, &metadata).await)
    }
}

/// 100 minus the severity penalty of every issue
pub fn score_issues(issues: &[Issue]) -> i32 {
    100 - issues.iter().map(|i| i.severity.penalty()).sum::<i32>()
}

/// Replace every occurrence of each correctable issue's pattern. An issue
/// whose replacement leaves the text unchanged is not recorded.
pub fn apply_corrections(text: &str, issues: &[Issue]) -> (String, Vec<Correction>) {
    let mut content = text.to_string();
    let mut corrections = Vec::new();

    for issue in issues.iter().filter(|i| i.auto_correctable) {
        let (Some(pattern), Some(replacement)) = (&issue.pattern, &issue.replacement) else {
            continue;
        };
        let updated = content.replace(pattern.as_str(), replacement);
        if updated != content {
            content = updated;
            corrections.push(Correction {
                issue_type: issue.issue_type,
                original: pattern.clone(),
                corrected: replacement.clone(),
                location: issue.location.clone(),
            });
        }
    }

    (content, corrections)
}
