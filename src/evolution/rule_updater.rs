// Rule Updater
//
// Applies the high-priority part of a rule evaluation to a rules document
// and appends the new version to its history. Used for both the writing
// rules and the proofreading rules; each pair of document and history is
// versioned independently.

use super::rules_document::RulesDocument;
use crate::config::DocumentAnchors;
use crate::error::{Result, ScrivenerError};
use crate::storage::{write_atomic, FileLock, JsonStore, RulesHistory};
use crate::types::{jst_now, RuleEvaluation, RuleVersion, RuleVersionNumber};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a rule evaluation ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleLifecycle {
    Idle,
    Evaluated,
    NoUpdate,
    Updated,
}

impl RuleLifecycle {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RuleLifecycle::NoUpdate | RuleLifecycle::Updated)
    }
}

/// What an applied update changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleUpdateOutcome {
    pub version: RuleVersion,
    pub section_inserted: bool,
    pub version_fields_updated: usize,
    /// Missing markers, one entry each
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RuleUpdater {
    document: PathBuf,
    history: JsonStore<RulesHistory>,
    anchors: DocumentAnchors,
}

impl RuleUpdater {
    pub fn new(
        document: impl Into<PathBuf>,
        history: JsonStore<RulesHistory>,
        anchors: DocumentAnchors,
    ) -> Self {
        Self {
            document: document.into(),
            history,
            anchors,
        }
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Apply `evaluation`. `Ok(None)` when it carries no high-priority update,
    /// in which case neither the document nor the history is touched.
    pub fn update(&self, evaluation: &RuleEvaluation) -> Result<Option<RuleUpdateOutcome>> {
        let updates = evaluation.high_priority();
        if updates.is_empty() {
            debug!(
                "No high-priority updates for {}, leaving it unchanged",
                self.document.display()
            );
            return Ok(None);
        }

        let _lock = FileLock::acquire(&self.document)?;

        let text = std::fs::read_to_string(&self.document).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScrivenerError::NotFound(self.document.clone()),
            _ => ScrivenerError::Io(e),
        })?;
        let mut doc = RulesDocument::parse(&text, &self.anchors)?;

        let version = doc
            .current_version()
            .map(|v| v.next_minor())
            .transpose()?
            .unwrap_or_else(RuleVersionNumber::first_update);
        let date = jst_now().format("%Y-%m-%d").to_string();

        let mut warnings = Vec::new();

        let section_inserted = doc.insert_section(version, &date, &updates);
        if !section_inserted {
            let message = format!(
                "insertion anchor '{}' not found in {}",
                self.anchors.insertion_heading,
                self.document.display()
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let version_fields_updated = doc.set_version(version);
        if version_fields_updated == 0 {
            let message = format!(
                "version field '{}' not found in {}",
                self.anchors.version_field_label,
                self.document.display()
            );
            warn!("{}", message);
            warnings.push(message);
        }

        write_atomic(&self.document, doc.render().as_bytes())?;

        let record = RuleVersion {
            version,
            date,
            updates,
            rationale: evaluation.rationale.clone(),
        };
        self.history.update(|history| {
            history.versions.push(record.clone());
            history
                .update_reasons
                .extend(record.rationale.iter().cloned());
        })?;

        info!(
            "Updated {} to v{} with {} rule(s)",
            self.document.display(),
            version,
            record.updates.len()
        );

        Ok(Some(RuleUpdateOutcome {
            version: record,
            section_inserted,
            version_fields_updated,
            warnings,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, SuggestedUpdate};
    use tempfile::TempDir;

    fn updater(dir: &TempDir, doc: &str) -> RuleUpdater {
        let path = dir.path().join("RULES.md");
        std::fs::write(&path, doc).unwrap();
        RuleUpdater::new(
            path,
            JsonStore::new(dir.path().join("rules_history.json")),
            DocumentAnchors::default(),
        )
    }

    fn evaluation(updates: Vec<SuggestedUpdate>) -> RuleEvaluation {
        let mut eval = RuleEvaluation::empty();
        eval.rationale = vec!["理由".to_string()];
        eval.suggested_updates = updates;
        eval
    }

    #[test]
    fn test_first_update_without_heading() {
        let dir = TempDir::new().unwrap();
        let updater = updater(&dir, "# Rules\n*バージョン: 1.0*\n### 今後の更新予定\n");

        let outcome = updater
            .update(&evaluation(vec![SuggestedUpdate::new("r", "a", Priority::High)]))
            .unwrap()
            .unwrap();

        assert_eq!(outcome.version.version.to_string(), "1.1");
        assert!(outcome.warnings.is_empty());
        let text = std::fs::read_to_string(updater.document()).unwrap();
        assert!(text.contains("*バージョン: 1.1*"));
        assert!(text.contains("### v1.1 ("));
    }

    #[test]
    fn test_missing_markers_still_recorded() {
        let dir = TempDir::new().unwrap();
        let updater = updater(&dir, "# Rules without markers\n");

        let outcome = updater
            .update(&evaluation(vec![SuggestedUpdate::new("r", "a", Priority::High)]))
            .unwrap()
            .unwrap();

        assert!(!outcome.section_inserted);
        assert_eq!(outcome.version_fields_updated, 0);
        assert_eq!(outcome.warnings.len(), 2);

        let history = JsonStore::<RulesHistory>::new(dir.path().join("rules_history.json"))
            .load()
            .unwrap();
        assert_eq!(history.versions.len(), 1);
        assert_eq!(history.update_reasons, vec!["理由"]);
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let dir = TempDir::new().unwrap();
        let updater = RuleUpdater::new(
            dir.path().join("absent.md"),
            JsonStore::new(dir.path().join("h.json")),
            DocumentAnchors::default(),
        );
        let err = updater
            .update(&evaluation(vec![SuggestedUpdate::new("r", "a", Priority::High)]))
            .unwrap_err();
        assert!(matches!(err, ScrivenerError::NotFound(_)));
        assert!(!dir.path().join("h.json").exists());
    }

    #[test]
    fn test_lifecycle_terminal_states() {
        assert!(!RuleLifecycle::Idle.is_terminal());
        assert!(!RuleLifecycle::Evaluated.is_terminal());
        assert!(RuleLifecycle::NoUpdate.is_terminal());
        assert!(RuleLifecycle::Updated.is_terminal());
    }
}
