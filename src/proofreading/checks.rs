//! Synchronous proofreading checks
//!
//! Each check appends zero or more [`Issue`]s. URL validation is async and
//! lives in the proofreader itself.

use super::issues::{Issue, IssueType, Severity};
use crate::config::ProofreadingConfig;
use crate::types::ArticleMetadata;
use crate::utils::string::truncate_at_char_boundary;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Latest known release per technology, as `(name, version)`
pub const LATEST_VERSIONS: [(&str, &str); 5] = [
    ("Python", "3.11"),
    ("Node.js", "20"),
    ("React", "18.2"),
    ("Next.js", "15"),
    ("Vue", "3.4"),
];

/// Deprecated usages and their replacements. Only `var ` is auto-corrected.
pub const DEPRECATED_TERMS: [(&str, &str); 5] = [
    ("componentWillMount", "useEffect"),
    ("componentWillReceiveProps", "useEffect または getDerivedStateFromProps"),
    ("findDOMNode", "ref"),
    ("React.createClass", "クラスコンポーネントまたは関数コンポーネント"),
    ("var ", "let または const"),
];

pub const TYPOS: [(&str, &str); 7] = [
    ("こども", "子ども"),
    ("いづれ", "いずれ"),
    ("すくなくとも", "少なくとも"),
    ("もとづ", "基づ"),
    ("おこな", "行な"),
    ("してる", "している"),
    ("してない", "していない"),
];

/// Terms that should be explained on first use
pub const TECHNICAL_TERMS: [&str; 9] = [
    "Docker",
    "Kubernetes",
    "CI/CD",
    "DevOps",
    "マイクロサービス",
    "レイテンシ",
    "スループット",
    "冪等性",
    "非同期処理",
];

const INSTALL_KEYWORDS: [&str; 4] = ["pip install", "npm install", "yarn add", "インストール"];
const DEPENDENCY_WORDS: [&str; 3] = ["ライブラリ", "パッケージ", "フレームワーク"];
const ERROR_KEYWORDS: [&str; 6] = ["try", "except", "catch", "エラー", "例外", "トラブルシューティング"];

/// Metadata date format used by `最新` staleness checks
pub const METADATA_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

struct Patterns {
    versions: Vec<(&'static str, &'static str, Regex)>,
    code_block: Regex,
    assignment: Regex,
    year: Regex,
    sentence_end: Regex,
    passive: Regex,
    fence_opener: Regex,
}

static PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns {
    versions: LATEST_VERSIONS
        .iter()
        .map(|(tech, latest)| {
            let pattern = format!(r"(?i){} (\d+(?:\.\d+){{0,2}})", regex::escape(tech));
            (*tech, *latest, Regex::new(&pattern).expect("Valid version regex"))
        })
        .collect(),
    code_block: Regex::new(r"(?s)```(?:python|javascript|typescript)?\n(.*?)\n```")
        .expect("Valid code block regex"),
    assignment: Regex::new(r"(?m)^\s*(\w+)\s*=").expect("Valid assignment regex"),
    year: Regex::new(r"\b(20[0-9]{2})年").expect("Valid year regex"),
    sentence_end: Regex::new(r"[。！？]").expect("Valid sentence regex"),
    passive: Regex::new(r"れる|られる").expect("Valid passive regex"),
    fence_opener: Regex::new(r"```[^\n]*\n").expect("Valid fence regex"),
});

/// `true` when `version` is behind `latest` on the major, or on the minor
/// with equal majors. Unparseable versions are never outdated.
pub fn is_version_outdated(version: &str, latest: &str) -> bool {
    let parse = |v: &str| -> Option<Vec<u32>> { v.split('.').map(|p| p.parse().ok()).collect() };
    let (Some(current), Some(latest)) = (parse(version), parse(latest)) else {
        return false;
    };
    match (current.first(), latest.first()) {
        (Some(c), Some(l)) if c < l => true,
        (Some(c), Some(l)) if c == l => match (current.get(1), latest.get(1)) {
            (Some(cm), Some(lm)) => cm < lm,
            _ => false,
        },
        _ => false,
    }
}

/// Outdated versions, deprecated usages and code-block problems
pub fn check_technical(text: &str, issues: &mut Vec<Issue>) {
    for (tech, latest, pattern) in &PATTERNS.versions {
        for caps in pattern.captures_iter(text) {
            let version = &caps[1];
            if is_version_outdated(version, latest) {
                issues.push(
                    Issue::new(
                        IssueType::VersionOutdated,
                        Severity::Medium,
                        format!("{} {}", tech, version),
                        version,
                        *latest,
                    )
                    .correctable(format!("{} {}", tech, version), format!("{} {}", tech, latest)),
                );
            }
        }
    }

    for (deprecated, replacement) in DEPRECATED_TERMS {
        if !text.contains(deprecated) {
            continue;
        }
        let issue = Issue::new(
            IssueType::DeprecatedUsage,
            Severity::High,
            format!("{}の使用", deprecated),
            deprecated,
            replacement,
        );
        issues.push(if deprecated == "var " {
            issue.correctable("var ", "const ")
        } else {
            issue
        });
    }

    for (index, caps) in PATTERNS.code_block.captures_iter(text).enumerate() {
        let location = format!("コードブロック{}", index + 1);
        for mut issue in check_code(&caps[1]) {
            issue.location = location.clone();
            issues.push(issue);
        }
    }
}

/// Import ordering and assigned-once names within one code block
pub fn check_code(code: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    if code.contains("import") && code.contains("from") {
        let lines: Vec<&str> = code.lines().collect();
        for pair in lines.windows(2) {
            let (previous, line) = (pair[0].trim(), pair[1].trim());
            if line.starts_with("from") && line.contains(" import ") {
                let grouped = previous.is_empty()
                    || previous.starts_with("from")
                    || previous.starts_with("import");
                if !grouped {
                    issues.push(Issue::new(
                        IssueType::ImportOrder,
                        Severity::Low,
                        "",
                        line,
                        "Import文を先頭にまとめる",
                    ));
                }
            }
        }
    }

    for caps in PATTERNS.assignment.captures_iter(code) {
        let name = &caps[1];
        if name == "_" || name == "__" {
            continue;
        }
        if code.matches(name).count() == 1 {
            issues.push(Issue::new(
                IssueType::UnusedVariable,
                Severity::Low,
                "",
                name,
                format!("未使用の変数 {}", name),
            ));
        }
    }

    issues
}

/// Old year references and stale `最新` claims
pub fn check_timeliness(
    text: &str,
    metadata: &ArticleMetadata,
    now: DateTime<FixedOffset>,
    config: &ProofreadingConfig,
    issues: &mut Vec<Issue>,
) {
    let cutoff = now.year() - config.outdated_year_span;
    for caps in PATTERNS.year.captures_iter(text) {
        let Ok(year) = caps[1].parse::<i32>() else {
            continue;
        };
        if year < cutoff {
            issues.push(Issue::new(
                IssueType::OutdatedReference,
                Severity::Low,
                format!("{}年", year),
                year.to_string(),
                "より新しい情報への更新を検討",
            ));
        }
    }

    if text.contains("最新") {
        let published = metadata
            .get("date")
            .and_then(|d| NaiveDateTime::parse_from_str(d, METADATA_DATE_FORMAT).ok());
        if let Some(published) = published {
            let age = now.naive_local() - published;
            if age.num_days() > config.stale_latest_days {
                issues.push(Issue::new(
                    IssueType::StaleLatestClaim,
                    Severity::Medium,
                    "「最新」という表現",
                    "最新",
                    "具体的な日付や時期を明記",
                ));
            }
        }
    }
}

/// Typos, long sentences, passive voice and unexplained terms
pub fn check_writing(text: &str, config: &ProofreadingConfig, issues: &mut Vec<Issue>) {
    for (typo, correct) in TYPOS {
        if text.contains(typo) {
            issues.push(
                Issue::new(IssueType::Typo, Severity::Low, typo, typo, correct)
                    .correctable(typo, correct),
            );
        }
    }

    for (index, sentence) in PATTERNS.sentence_end.split(text).enumerate() {
        if sentence.chars().count() > config.long_sentence_chars {
            issues.push(Issue::new(
                IssueType::LongSentence,
                Severity::Low,
                format!("文{}", index + 1),
                truncate_at_char_boundary(sentence, 50),
                "文を分割して読みやすくする",
            ));
        }
    }

    let passive = PATTERNS.passive.find_iter(text).count();
    if passive > config.passive_voice_limit {
        issues.push(Issue::new(
            IssueType::ExcessivePassiveVoice,
            Severity::Low,
            "全体",
            format!("受動態が{}回使用", passive),
            "能動態を使って文章を活発にする",
        ));
    }

    let lowered = text.to_lowercase();
    for term in TECHNICAL_TERMS {
        let term_lower = term.to_lowercase();
        if !lowered.contains(&term_lower) {
            continue;
        }
        let explained = ["とは", "は", "（", " ("]
            .iter()
            .any(|suffix| lowered.contains(&format!("{}{}", term_lower, suffix)));
        if !explained {
            issues.push(Issue::new(
                IssueType::MissingTermExplanation,
                Severity::Medium,
                term,
                term,
                format!("{}の説明を追加", term),
            ));
        }
    }
}

/// Code example count, installation steps and error-handling coverage
pub fn check_practicality(text: &str, issues: &mut Vec<Issue>) {
    let examples = PATTERNS.fence_opener.find_iter(text).count();
    if examples < 3 {
        issues.push(Issue::new(
            IssueType::InsufficientCodeExamples,
            Severity::Medium,
            "全体",
            format!("コード例が{}個", examples),
            "より多くの実装例を追加",
        ));
    }

    let has_install = INSTALL_KEYWORDS.iter().any(|k| text.contains(k));
    let mentions_dependency = DEPENDENCY_WORDS.iter().any(|w| text.contains(w));
    if !has_install && mentions_dependency {
        issues.push(Issue::new(
            IssueType::MissingInstallationGuide,
            Severity::Medium,
            "セットアップセクション",
            "インストール手順なし",
            "インストール手順を追加",
        ));
    }

    if !ERROR_KEYWORDS.iter().any(|k| text.contains(k)) {
        issues.push(Issue::new(
            IssueType::MissingErrorHandling,
            Severity::Low,
            "全体",
            "エラーハンドリングの言及なし",
            "エラーハンドリングやトラブルシューティングを追加",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::jst;
    use chrono::TimeZone;

    fn kinds(issues: &[Issue]) -> Vec<IssueType> {
        issues.iter().map(|i| i.issue_type).collect()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
        jst().with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_version_comparison() {
        assert!(is_version_outdated("3.8", "3.11"));
        assert!(is_version_outdated("2.7", "3.11"));
        assert!(!is_version_outdated("3.11", "3.11"));
        assert!(!is_version_outdated("3.12", "3.11"));
        assert!(is_version_outdated("18", "20"));
        assert!(!is_version_outdated("20.1", "20"));
        assert!(!is_version_outdated("x.y", "3.11"));
    }

    #[test]
    fn test_outdated_version_is_correctable() {
        let mut issues = Vec::new();
        check_technical("We use Python 3.8 and React 18.2 here.", &mut issues);
        assert_eq!(kinds(&issues), vec![IssueType::VersionOutdated]);
        assert_eq!(issues[0].pattern.as_deref(), Some("Python 3.8"));
        assert_eq!(issues[0].replacement.as_deref(), Some("Python 3.11"));
    }

    #[test]
    fn test_deprecated_usage() {
        let mut issues = Vec::new();
        check_technical("var x = 1; findDOMNode(this)", &mut issues);
        let deprecated: Vec<_> = issues
            .iter()
            .filter(|i| i.issue_type == IssueType::DeprecatedUsage)
            .collect();
        assert_eq!(deprecated.len(), 2);
        assert!(deprecated.iter().all(|i| i.severity == Severity::High));
        let var = deprecated.iter().find(|i| i.original == "var ").unwrap();
        assert!(var.auto_correctable);
        assert!(!deprecated.iter().find(|i| i.original == "findDOMNode").unwrap().auto_correctable);
    }

    #[test]
    fn test_code_block_checks_use_block_location() {
        let text = "intro\n```python\nimport os\nresult = compute()\nprint(os)\n```\n";
        let mut issues = Vec::new();
        check_technical(text, &mut issues);
        let unused: Vec<_> = issues
            .iter()
            .filter(|i| i.issue_type == IssueType::UnusedVariable)
            .collect();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].original, "result");
        assert_eq!(unused[0].location, "コードブロック1");
        assert_eq!(unused[0].suggestion, "未使用の変数 result");
    }

    #[test]
    fn test_import_order() {
        let code = "import os\nx = os.getcwd()\nfrom pathlib import Path\nprint(x, Path)";
        assert!(kinds(&check_code(code)).contains(&IssueType::ImportOrder));

        let grouped = "import os\nfrom pathlib import Path\nprint(os, Path)";
        assert!(!kinds(&check_code(grouped)).contains(&IssueType::ImportOrder));
    }

    #[test]
    fn test_old_year_reference() {
        let config = ProofreadingConfig::default();
        let mut issues = Vec::new();
        check_timeliness(
            "2020年の調査と 2025年の調査",
            &ArticleMetadata::new(),
            at(2025, 6, 1),
            &config,
            &mut issues,
        );
        assert_eq!(kinds(&issues), vec![IssueType::OutdatedReference]);
        assert_eq!(issues[0].original, "2020");
    }

    #[test]
    fn test_stale_latest_claim() {
        let config = ProofreadingConfig::default();
        let mut metadata = ArticleMetadata::new();
        metadata.insert("date", "2025-01-01 09:00");

        let mut issues = Vec::new();
        check_timeliness("最新の機能", &metadata, at(2025, 3, 1), &config, &mut issues);
        assert_eq!(kinds(&issues), vec![IssueType::StaleLatestClaim]);

        let mut fresh = Vec::new();
        check_timeliness("最新の機能", &metadata, at(2025, 1, 15), &config, &mut fresh);
        assert!(fresh.is_empty());
    }

    #[test]
    fn test_typos_and_passive_voice() {
        let config = ProofreadingConfig::default();
        let text = format!("こどもが遊んでる。{}", "言われる。".repeat(21));
        let mut issues = Vec::new();
        check_writing(&text, &config, &mut issues);

        let typo = issues.iter().find(|i| i.issue_type == IssueType::Typo).unwrap();
        assert_eq!(typo.replacement.as_deref(), Some("子ども"));
        let passive = issues
            .iter()
            .find(|i| i.issue_type == IssueType::ExcessivePassiveVoice)
            .unwrap();
        assert_eq!(passive.original, "受動態が21回使用");
    }

    #[test]
    fn test_long_sentence_is_truncated() {
        let config = ProofreadingConfig::default();
        let text = format!("{}。短い。", "あ".repeat(120));
        let mut issues = Vec::new();
        check_writing(&text, &config, &mut issues);
        let long = issues
            .iter()
            .find(|i| i.issue_type == IssueType::LongSentence)
            .unwrap();
        assert_eq!(long.location, "文1");
        assert_eq!(long.suggestion, "文を分割して読みやすくする");
        assert_eq!(long.original, format!("{}...", "あ".repeat(50)));
    }

    #[test]
    fn test_term_explanations() {
        let config = ProofreadingConfig::default();
        let mut issues = Vec::new();
        check_writing("Dockerとはコンテナ技術です。Kubernetesを使う。", &config, &mut issues);
        let missing: Vec<_> = issues
            .iter()
            .filter(|i| i.issue_type == IssueType::MissingTermExplanation)
            .map(|i| i.original.as_str())
            .collect();
        assert_eq!(missing, vec!["Kubernetes"]);
    }

    #[test]
    fn test_practicality() {
        let mut issues = Vec::new();
        check_practicality("このライブラリは便利です。", &mut issues);
        assert_eq!(
            kinds(&issues),
            vec![
                IssueType::InsufficientCodeExamples,
                IssueType::MissingInstallationGuide,
                IssueType::MissingErrorHandling,
            ]
        );
        assert_eq!(issues[0].original, "コード例が0個");

        let rich = "```\na\n```\n```\nb\n```\n```\nc\n```\npip install x でエラーを確認";
        let mut none = Vec::new();
        check_practicality(rich, &mut none);
        assert!(none.is_empty());
    }
}
