//! Proofreading pass against files on disk

mod common;

use common::Workspace;
use scrivener_core::evolution::run_job;
use scrivener_core::proofreading::{IssueType, ProofreadingPass, Proofreader};
use scrivener_core::storage::{FileLock, JsonStore, ProofreadingLog, RulesHistory};
use std::time::Duration;

const OUTDATED_POST: &str = "---\ntitle: Old\ndate: 2025-01-01 09:00\n---\nPython 3.8 で最新の書き方を紹介します。\n\n```javascript\nvar total = 1\nconsole.log(total)\n```\n";

const PROOFREADING_RULES: &str = "# 校正ルール\n\n*バージョン: 2.0*\n\n### v2.0 (2025-01-01)\n- 初版\n\n### 今後の更新予定\n- 未定\n";

#[tokio::test]
async fn test_dry_run_leaves_article_untouched() {
    let ws = Workspace::new();
    let post = ws.post("old.md", OUTDATED_POST);

    let outcome = ProofreadingPass::new(&ws.config, &post, false)
        .unwrap()
        .execute()
        .await
        .unwrap();

    assert!(!outcome.applied);
    assert!(outcome.result.auto_corrected);
    assert_eq!(ws.read(&post), OUTDATED_POST);
    assert_eq!(outcome.result.article_id, "old");

    let kinds: Vec<_> = outcome
        .result
        .issues_found
        .iter()
        .map(|i| i.issue_type)
        .collect();
    assert!(kinds.contains(&IssueType::VersionOutdated));
    assert!(kinds.contains(&IssueType::DeprecatedUsage));
    assert!(kinds.contains(&IssueType::StaleLatestClaim));
}

#[tokio::test]
async fn test_apply_writes_corrections_and_logs() {
    let ws = Workspace::new();
    let post = ws.post("old.md", OUTDATED_POST);

    let report = run_job(&ProofreadingPass::new(&ws.config, &post, true).unwrap())
        .await
        .unwrap();
    assert_eq!(report.items_processed, 1);
    assert!(report.outputs.contains(&post));

    let text = ws.read(&post);
    assert!(text.contains("Python 3.11"));
    assert!(text.contains("const total = 1"));
    assert!(text.starts_with("---\ntitle: Old\n"));

    let log: ProofreadingLog = JsonStore::new(&ws.config.paths.proofreading_log)
        .load()
        .unwrap();
    assert_eq!(log.logs.len(), 1);
    assert_eq!(log.common_issues["version_outdated"], 1);
    let entry = &log.logs[0];
    assert_eq!(
        entry.final_score,
        (entry.original_score + 3 * entry.corrections.len() as i32).min(100)
    );
}

#[tokio::test]
async fn test_recurring_outdated_versions_update_proofreading_rules() {
    let ws = Workspace::new();
    std::fs::write(&ws.config.paths.proofreading_rules_document, PROOFREADING_RULES).unwrap();

    let mut last = None;
    for i in 0..3 {
        let post = ws.post(&format!("post-{}.md", i), OUTDATED_POST);
        last = Some(
            ProofreadingPass::new(&ws.config, &post, false)
                .unwrap()
                .execute()
                .await
                .unwrap(),
        );
    }
    let outcome = last.unwrap();

    let update = outcome.rule_update.expect("third pass should update rules");
    assert_eq!(update.version.version.to_string(), "2.1");
    let document = ws.read(&ws.config.paths.proofreading_rules_document);
    assert!(document.contains("バージョン情報の自動更新強化"));
    assert!(document.contains("*バージョン: 2.1*"));

    // Writing rules history is versioned independently
    let proofreading_history: RulesHistory =
        JsonStore::new(&ws.config.paths.proofreading_rules_history)
            .load()
            .unwrap();
    assert_eq!(proofreading_history.versions.len(), 1);
    assert!(!ws.config.paths.rules_history.exists());

    let log: ProofreadingLog = JsonStore::new(&ws.config.paths.proofreading_log)
        .load()
        .unwrap();
    assert_eq!(log.logs.len(), 3);
    assert!(!log.improvement_patterns.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn test_pass_waits_for_log_lock_off_the_runtime() {
    let ws = Workspace::new();
    let post = ws.post("old.md", OUTDATED_POST);
    let held = FileLock::acquire(&ws.config.paths.proofreading_log).unwrap();

    let pass = ProofreadingPass::new(&ws.config, &post, false).unwrap();
    let pending = tokio::spawn(async move { pass.execute().await });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!pending.is_finished());
    drop(held);

    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome.result.article_id, "old");
}

#[tokio::test]
async fn test_proofreader_from_config_uses_shallow_check() {
    let ws = Workspace::new();
    let proofreader = Proofreader::new(ws.config.proofreading.clone()).unwrap();
    let result = proofreader
        .proofread(
            "links",
            "See https://github.com/rust-lang/rust and https://example.com/x",
            &Default::default(),
        )
        .await;
    assert!(!result
        .issues_found
        .iter()
        .any(|i| i.issue_type == IssueType::InvalidUrl));
}
