//! Rules-document update behaviour against real files

mod common;

use common::{Workspace, RULES_DOCUMENT};
use scrivener_core::evolution::{RuleEvaluator, RuleUpdater};
use scrivener_core::storage::{RulesHistory, Stores};
use scrivener_core::types::jst_now;
use scrivener_core::{Priority, RuleEvaluation, ScrivenerError, SuggestedUpdate};

fn updater(ws: &Workspace) -> (RuleUpdater, Stores) {
    let stores = Stores::from_paths(&ws.config.paths);
    let updater = RuleUpdater::new(
        &ws.config.paths.rules_document,
        stores.rules.clone(),
        ws.config.rules.anchors.clone(),
    );
    (updater, stores)
}

fn evaluation(updates: Vec<SuggestedUpdate>) -> RuleEvaluation {
    RuleEvaluation {
        suggested_updates: updates,
        rationale: vec!["平均スコアが低下".to_string()],
        ..RuleEvaluation::empty()
    }
}

#[test]
fn test_version_bump_lists_high_priority_updates() {
    let ws = Workspace::new();
    let document = ws.write_rules_document();
    let (updater, stores) = updater(&ws);

    let outcome = updater
        .update(&evaluation(vec![
            SuggestedUpdate::new("読みやすさの基準を強化", "見出しを増やす", Priority::High),
            SuggestedUpdate::new("独自性の要件を更新", "独自の視点を追加", Priority::Medium),
            SuggestedUpdate::new("コード例不足に対するルール追加", "コード例を3つ以上", Priority::High),
        ]))
        .unwrap()
        .expect("high-priority updates should apply");

    assert_eq!(outcome.version.version.to_string(), "1.4");
    assert_eq!(outcome.version.updates.len(), 2);
    assert!(outcome.section_inserted);
    assert_eq!(outcome.version_fields_updated, 1);
    assert!(outcome.warnings.is_empty());

    let today = jst_now().format("%Y-%m-%d").to_string();
    let text = ws.read(&document);
    let heading = format!("### v1.4 ({})", today);
    assert!(text.contains(&heading));
    assert!(text.contains("*バージョン: 1.4*"));
    assert!(!text.contains("独自性の要件を更新"));

    // New section sits right before the anchor, after the previous version
    let section_at = text.find(&heading).unwrap();
    assert!(text.find("### v1.3").unwrap() < section_at);
    assert!(section_at < text.find("### 今後の更新予定").unwrap());
    let listed = text[section_at..text.find("### 今後の更新予定").unwrap()]
        .lines()
        .filter(|l| l.starts_with("- "))
        .count();
    assert_eq!(listed, 2);

    let history: RulesHistory = stores.rules.load().unwrap();
    assert_eq!(history.versions.len(), 1);
    assert_eq!(history.versions[0].version.to_string(), "1.4");
    assert_eq!(history.update_reasons, vec!["平均スコアが低下"]);
}

#[test]
fn test_medium_only_is_a_no_op() {
    let ws = Workspace::new();
    let document = ws.write_rules_document();
    let (updater, stores) = updater(&ws);

    let result = updater
        .update(&evaluation(vec![SuggestedUpdate::new(
            "独自性の要件を更新",
            "独自の視点を追加",
            Priority::Medium,
        )]))
        .unwrap();

    assert!(result.is_none());
    assert_eq!(std::fs::read(&document).unwrap(), RULES_DOCUMENT.as_bytes());
    assert!(!stores.rules.path().exists());
}

#[test]
fn test_missing_markers_warn_but_record() {
    let ws = Workspace::new();
    std::fs::write(&ws.config.paths.rules_document, "# ルール\n\n- 本文のみ\n").unwrap();
    let (updater, stores) = updater(&ws);

    let outcome = updater
        .update(&evaluation(vec![SuggestedUpdate::new(
            "読みやすさの基準を強化",
            "見出しを増やす",
            Priority::High,
        )]))
        .unwrap()
        .unwrap();

    assert_eq!(outcome.version.version.to_string(), "1.1");
    assert!(!outcome.section_inserted);
    assert_eq!(outcome.version_fields_updated, 0);
    assert_eq!(outcome.warnings.len(), 2);
    assert_eq!(stores.rules.load().unwrap().versions.len(), 1);
}

#[test]
fn test_successive_updates_keep_counting() {
    let ws = Workspace::new();
    let document = ws.write_rules_document();
    let (updater, stores) = updater(&ws);
    let high = evaluation(vec![SuggestedUpdate::new("r", "a", Priority::High)]);

    updater.update(&high).unwrap().unwrap();
    let second = updater.update(&high).unwrap().unwrap();

    assert_eq!(second.version.version.to_string(), "1.5");
    assert!(ws.read(&document).contains("*バージョン: 1.5*"));
    assert_eq!(stores.rules.load().unwrap().versions.len(), 2);
}

#[test]
fn test_exhausted_minor_version_is_rejected() {
    let ws = Workspace::new();
    let document = RULES_DOCUMENT.replace("### v1.3", &format!("### v1.{}", u32::MAX));
    std::fs::write(&ws.config.paths.rules_document, &document).unwrap();
    let (updater, stores) = updater(&ws);

    let err = updater
        .update(&evaluation(vec![SuggestedUpdate::new("r", "a", Priority::High)]))
        .unwrap_err();

    assert!(matches!(err, ScrivenerError::InvalidVersion(_)));
    assert_eq!(ws.read(&ws.config.paths.rules_document), document);
    assert!(!stores.rules.path().exists());
}

#[test]
fn test_evaluator_output_drives_updater() {
    let ws = Workspace::new();
    ws.write_rules_document();
    let (updater, _) = updater(&ws);

    // Empty batches never change the document
    let evaluation = RuleEvaluator::new(ws.config.rules.clone()).evaluate(&[]);
    assert_eq!(evaluation.current_effectiveness, 0.0);
    assert!(updater.update(&evaluation).unwrap().is_none());
}
