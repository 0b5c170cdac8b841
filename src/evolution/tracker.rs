// Evolution Tracker
//
// Summarises the stored histories and the posts directory into statistics,
// an overall grade and a Markdown report, and records each run as a session
// in the evolution log.

use crate::config::ScrivenerConfig;
use crate::error::Result;
use crate::evaluation::metadata::{extract_metadata, strip_front_matter};
use crate::storage::{
    write_atomic, EvaluationHistory, EvolutionLog, EvolutionSession, JsonStore, Milestone,
    RulesHistory,
};
use crate::types::{jst_now, Dimension, EvaluationRecord, Priority, RuleVersion, ScoreSet};
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Direction of a score series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTrend {
    InsufficientData,
    Improving,
    Declining,
    Stable,
}

impl std::fmt::Display for ScoreTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ScoreTrend::InsufficientData => "insufficient_data",
            ScoreTrend::Improving => "improving",
            ScoreTrend::Declining => "declining",
            ScoreTrend::Stable => "stable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub average: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
    pub trend: ScoreTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub total_score: f64,
    pub scores: ScoreSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentIssue {
    pub issue: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementArea {
    pub category: String,
    pub current_average: f64,
    pub priority: Priority,
    pub trend: ScoreTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationAnalysis {
    pub total_evaluations: usize,
    /// Four dimensions then `total_score`
    pub statistics: Vec<CategoryStats>,
    pub articles_by_date: BTreeMap<String, Vec<ArticleSummary>>,
    pub recent_issues: Vec<RecentIssue>,
    pub improvement_areas: Vec<ImprovementArea>,
}

impl EvaluationAnalysis {
    pub fn stats(&self, category: &str) -> Option<&CategoryStats> {
        self.statistics.iter().find(|s| s.category == category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesAnalysis {
    pub total_rule_updates: usize,
    pub rule_evolution: Vec<RuleVersion>,
    pub most_common_issues: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostQualityMetrics {
    pub filename: String,
    /// Numeric id from an `article_<n>` file name, 0 otherwise
    pub timestamp: i64,
    pub character_count: usize,
    /// Raw count of fence markers
    pub code_blocks: usize,
    /// Raw count of `##`
    pub sections: usize,
    pub has_thought_process: bool,
    pub has_references: bool,
    pub production_time: String,
    pub reading_time: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityImprovement {
    pub metric: String,
    pub improvement: String,
    pub significance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostQualityTrends {
    pub total_articles: usize,
    /// Last ten by timestamp
    pub quality_progression: Vec<PostQualityMetrics>,
    pub quality_improvements: Vec<QualityImprovement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    pub overall_score: f64,
    pub evaluation_component: f64,
    pub quality_component: f64,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionAnalysis {
    pub timestamp: DateTime<FixedOffset>,
    /// None when there are no stored evaluations
    pub evaluation_analysis: Option<EvaluationAnalysis>,
    pub rules_analysis: RulesAnalysis,
    /// None when the posts directory does not exist
    pub quality_trends: Option<PostQualityTrends>,
    pub overall_score: OverallScore,
}

/// A generated report and where it was written
#[derive(Debug, Clone)]
pub struct EvolutionReport {
    pub session_id: String,
    pub path: PathBuf,
    pub markdown: String,
    pub analysis: EvolutionAnalysis,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Last three against everything before them, with a ±2 dead band. Series
/// shorter than six compare against all but the last value.
pub fn calculate_trend(scores: &[f64]) -> ScoreTrend {
    let n = scores.len();
    if n < 2 {
        return ScoreTrend::InsufficientData;
    }

    let recent = if n >= 3 { &scores[n - 3..] } else { &scores[n - 1..] };
    let older = if n >= 6 { &scores[..n - 3] } else { &scores[..n - 1] };

    let recent_avg = mean(recent);
    let older_avg = mean(older);

    if recent_avg > older_avg + 2.0 {
        ScoreTrend::Improving
    } else if recent_avg < older_avg - 2.0 {
        ScoreTrend::Declining
    } else {
        ScoreTrend::Stable
    }
}

fn category_stats(category: &str, scores: &[f64]) -> CategoryStats {
    CategoryStats {
        category: category.to_string(),
        average: round_to(mean(scores), 2),
        median: round_to(median(scores), 2),
        max: scores.iter().copied().fold(f64::MIN, f64::max),
        min: scores.iter().copied().fold(f64::MAX, f64::min),
        count: scores.len(),
        trend: calculate_trend(scores),
    }
}

/// Top five weaknesses over the last five evaluations, most frequent first
pub fn recent_issues(evaluations: &[EvaluationRecord]) -> Vec<RecentIssue> {
    let start = evaluations.len().saturating_sub(5);
    let mut tally: Vec<RecentIssue> = Vec::new();
    for weakness in evaluations[start..].iter().flat_map(|e| e.weaknesses.iter()) {
        match tally.iter_mut().find(|i| &i.issue == weakness) {
            Some(issue) => issue.frequency += 1,
            None => tally.push(RecentIssue {
                issue: weakness.clone(),
                frequency: 1,
            }),
        }
    }
    // stable, so ties keep first-seen order
    tally.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    tally.truncate(5);
    tally
}

/// Dimensions averaging below 18; high priority below 15
pub fn improvement_areas(statistics: &[CategoryStats]) -> Vec<ImprovementArea> {
    statistics
        .iter()
        .filter(|s| s.category != "total_score" && s.average < 18.0)
        .map(|s| ImprovementArea {
            category: s.category.clone(),
            current_average: s.average,
            priority: if s.average < 15.0 {
                Priority::High
            } else {
                Priority::Medium
            },
            trend: s.trend,
        })
        .collect()
}

pub fn analyze_evaluations(evaluations: &[EvaluationRecord]) -> Option<EvaluationAnalysis> {
    if evaluations.is_empty() {
        return None;
    }

    let mut statistics: Vec<CategoryStats> = Dimension::ALL
        .iter()
        .map(|dim| {
            let scores: Vec<f64> = evaluations.iter().map(|e| e.scores.get(*dim)).collect();
            category_stats(dim.as_str(), &scores)
        })
        .collect();
    let totals: Vec<f64> = evaluations.iter().map(|e| e.total_score).collect();
    statistics.push(category_stats("total_score", &totals));

    let mut articles_by_date: BTreeMap<String, Vec<ArticleSummary>> = BTreeMap::new();
    for evaluation in evaluations {
        articles_by_date
            .entry(evaluation.timestamp.format("%Y-%m-%d").to_string())
            .or_default()
            .push(ArticleSummary {
                title: evaluation.title().to_string(),
                total_score: evaluation.total_score,
                scores: evaluation.scores,
            });
    }

    Some(EvaluationAnalysis {
        total_evaluations: evaluations.len(),
        improvement_areas: improvement_areas(&statistics),
        statistics,
        articles_by_date,
        recent_issues: recent_issues(evaluations),
    })
}

/// Classify applied rule updates by wording
pub fn rule_patterns(versions: &[RuleVersion]) -> BTreeMap<String, usize> {
    let mut patterns = BTreeMap::new();
    for update in versions.iter().flat_map(|v| v.updates.iter()) {
        let kind = if update.rule.contains("不足") {
            "content_insufficiency"
        } else if update.rule.contains("改善が必要") {
            "quality_improvement"
        } else {
            "general_enhancement"
        };
        *patterns.entry(kind.to_string()).or_insert(0) += 1;
    }
    patterns
}

pub fn analyze_rules(history: &RulesHistory) -> RulesAnalysis {
    RulesAnalysis {
        total_rule_updates: history.versions.len(),
        rule_evolution: history.versions.clone(),
        most_common_issues: rule_patterns(&history.versions),
    }
}

fn article_number(filename: &str) -> i64 {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"article_(\d+)").expect("Valid article number regex"));
    PATTERN
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

pub fn post_metrics(filename: &str, text: &str) -> PostQualityMetrics {
    let metadata = extract_metadata(text);
    let body = strip_front_matter(text);
    let unknown = "不明";

    PostQualityMetrics {
        filename: filename.to_string(),
        timestamp: article_number(filename),
        character_count: body.chars().count(),
        code_blocks: body.matches("```").count(),
        sections: body.matches("##").count(),
        has_thought_process: body.contains("思考プロセス"),
        has_references: body.contains("参考") || body.contains("リンク"),
        production_time: metadata.get_or("production_time", unknown).to_string(),
        reading_time: metadata.get_or("reading_time", unknown).to_string(),
        difficulty: metadata.get_or("difficulty", unknown).to_string(),
    }
}

pub fn quality_improvements(metrics: &[PostQualityMetrics]) -> Vec<QualityImprovement> {
    let n = metrics.len();
    if n < 2 {
        return Vec::new();
    }

    let mut improvements = Vec::new();

    let chars: Vec<f64> = metrics.iter().map(|m| m.character_count as f64).collect();
    if n > 3 {
        let recent_avg = mean(&chars[n - 3..]);
        let older_avg = mean(&chars[..n - 3]);
        if older_avg > 0.0 && recent_avg > older_avg * 1.5 {
            improvements.push(QualityImprovement {
                metric: "character_count".to_string(),
                improvement: format!(
                    "{:.0}文字 (前期比 {:.1}%向上)",
                    recent_avg,
                    (recent_avg / older_avg - 1.0) * 100.0
                ),
                significance: "major".to_string(),
            });
        }
    }

    let with_thought = metrics[n.saturating_sub(5)..]
        .iter()
        .filter(|m| m.has_thought_process)
        .count();
    if with_thought >= 3 {
        improvements.push(QualityImprovement {
            metric: "thought_process_inclusion".to_string(),
            improvement: format!("最新5記事中{}記事に思考プロセスを追加", with_thought),
            significance: "moderate".to_string(),
        });
    }

    improvements
}

pub fn grade(score: f64) -> &'static str {
    if score >= 90.0 {
        "A+"
    } else if score >= 80.0 {
        "A"
    } else if score >= 70.0 {
        "B+"
    } else if score >= 60.0 {
        "B"
    } else {
        "C"
    }
}

pub fn overall_score(
    evaluation: Option<&EvaluationAnalysis>,
    quality: Option<&PostQualityTrends>,
) -> OverallScore {
    let eval_score = evaluation
        .and_then(|e| e.stats("total_score"))
        .map(|s| s.average)
        .unwrap_or(0.0);
    let quality_score =
        50.0 + quality.map(|q| q.quality_improvements.len()).unwrap_or(0) as f64 * 10.0;
    let overall = ((eval_score + quality_score) / 2.0).min(100.0);

    OverallScore {
        overall_score: round_to(overall, 1),
        evaluation_component: round_to(eval_score, 1),
        quality_component: round_to(quality_score, 1),
        grade: grade(overall).to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct EvolutionTracker {
    evaluations: JsonStore<EvaluationHistory>,
    rules: JsonStore<RulesHistory>,
    log: JsonStore<EvolutionLog>,
    posts_dir: PathBuf,
    reports_dir: PathBuf,
}

impl EvolutionTracker {
    pub fn new(config: &ScrivenerConfig) -> Self {
        let paths = &config.paths;
        Self {
            evaluations: JsonStore::new(&paths.evaluation_history),
            rules: JsonStore::new(&paths.rules_history),
            log: JsonStore::new(&paths.evolution_history),
            posts_dir: paths.posts_dir.clone(),
            reports_dir: paths.reports_dir.clone(),
        }
    }

    fn analyze_posts(&self) -> Result<Option<PostQualityTrends>> {
        if !self.posts_dir.is_dir() {
            debug!("Posts directory {} not found", self.posts_dir.display());
            return Ok(None);
        }

        let mut metrics = Vec::new();
        for path in markdown_files(&self.posts_dir)? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match std::fs::read_to_string(&path) {
                Ok(text) => metrics.push(post_metrics(&name, &text)),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        metrics.sort_by_key(|m| m.timestamp);

        let start = metrics.len().saturating_sub(10);
        Ok(Some(PostQualityTrends {
            total_articles: metrics.len(),
            quality_improvements: quality_improvements(&metrics),
            quality_progression: metrics[start..].to_vec(),
        }))
    }

    pub fn analyze(&self) -> Result<EvolutionAnalysis> {
        let evaluations = self.evaluations.load()?;
        let rules = self.rules.load()?;

        let evaluation_analysis = analyze_evaluations(&evaluations.evaluations);
        let quality_trends = self.analyze_posts()?;
        let overall = overall_score(evaluation_analysis.as_ref(), quality_trends.as_ref());

        Ok(EvolutionAnalysis {
            timestamp: jst_now(),
            evaluation_analysis,
            rules_analysis: analyze_rules(&rules),
            quality_trends,
            overall_score: overall,
        })
    }

    /// Append a session for `analysis` and return its id
    pub fn record_session(&self, analysis: &EvolutionAnalysis) -> Result<String> {
        let now = jst_now();
        let session_id = format!("evolution_{}", now.timestamp());
        let date = now.format("%Y-%m-%d").to_string();
        let snapshot = serde_json::to_value(analysis)?;

        self.log.update(|log| {
            let previous_grade = log
                .metrics_over_time
                .values()
                .next_back()
                .map(|s| s.grade.clone());
            if let Some(previous) = previous_grade {
                if previous != analysis.overall_score.grade {
                    log.system_milestones.push(Milestone {
                        date: date.clone(),
                        description: format!(
                            "グレード {} → {}",
                            previous, analysis.overall_score.grade
                        ),
                    });
                }
            }

            log.evolution_sessions.push(EvolutionSession {
                session_id: session_id.clone(),
                timestamp: now,
                analysis: snapshot,
                improvements_implemented: Vec::new(),
                next_steps: analysis
                    .evaluation_analysis
                    .as_ref()
                    .map(|e| {
                        e.improvement_areas
                            .iter()
                            .map(|a| format!("{}の改善", a.category))
                            .collect()
                    })
                    .unwrap_or_default(),
            });
            log.improvement_patterns = analysis.rules_analysis.most_common_issues.clone();
            log.metrics_over_time
                .insert(date.clone(), analysis.overall_score.clone());
        })?;

        info!("Recorded evolution session {}", session_id);
        Ok(session_id)
    }

    /// Analyze, record a session and write `evolution_report_<session>.md`
    pub fn generate_report(&self) -> Result<EvolutionReport> {
        let analysis = self.analyze()?;
        let session_id = self.record_session(&analysis)?;
        let markdown = render_report(&analysis, &session_id);

        let path = self
            .reports_dir
            .join(format!("evolution_report_{}.md", session_id));
        write_atomic(&path, markdown.as_bytes())?;
        info!("Wrote evolution report {}", path.display());

        Ok(EvolutionReport {
            session_id,
            path,
            markdown,
            analysis,
        })
    }
}

/// `*.md` files directly under `dir`
pub fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Markdown rendering of one evolution session
pub struct ReportMarkdown<'a> {
    pub analysis: &'a EvolutionAnalysis,
    pub session_id: &'a str,
}

pub fn render_report(analysis: &EvolutionAnalysis, session_id: &str) -> String {
    ReportMarkdown {
        analysis,
        session_id,
    }
    .to_string()
}

impl fmt::Display for ReportMarkdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.analysis;
        let session_id = self.session_id;
        let overall = &analysis.overall_score;

        writeln!(f, "# 自己進化レポート\n")?;
        writeln!(
            f,
            "**生成日時**: {}",
            analysis.timestamp.format("%Y-%m-%d %H:%M:%S JST")
        )?;
        writeln!(f, "**セッションID**: {}\n", session_id)?;
        writeln!(f, "## 現状分析\n\n### 記事評価統計")?;

        if let Some(eval) = &analysis.evaluation_analysis {
            for stats in &eval.statistics {
                writeln!(
                    f,
                    "- **{}**: 平均 {}/25 (トレンド: {})",
                    stats.category, stats.average, stats.trend
                )?;
            }
        }

        writeln!(f, "\n### 総合スコア")?;
        writeln!(
            f,
            "- **総合評価**: {}/100 (グレード: {})",
            overall.overall_score, overall.grade
        )?;
        writeln!(
            f,
            "- **評価コンポーネント**: {}/100",
            overall.evaluation_component
        )?;
        writeln!(
            f,
            "- **品質コンポーネント**: {}/100",
            overall.quality_component
        )?;

        let rules = &analysis.rules_analysis;
        writeln!(f, "\n## ルール更新\n")?;
        writeln!(f, "- **更新回数**: {}", rules.total_rule_updates)?;
        for (pattern, count) in &rules.most_common_issues {
            writeln!(f, "- {}: {}", pattern, count)?;
        }

        writeln!(f, "\n## 品質の進化\n")?;
        if let Some(quality) = &analysis.quality_trends {
            for improvement in &quality.quality_improvements {
                writeln!(
                    f,
                    "- **{}**: {} ({})",
                    improvement.metric, improvement.improvement, improvement.significance
                )?;
            }
        }

        writeln!(f, "\n## 今後の改善計画\n\n### 高優先度")?;
        if let Some(eval) = &analysis.evaluation_analysis {
            for area in eval
                .improvement_areas
                .iter()
                .filter(|a| a.priority == Priority::High)
            {
                writeln!(
                    f,
                    "- **{}**: 現在平均 {}/25 (トレンド: {})",
                    area.category, area.current_average, area.trend
                )?;
            }

            writeln!(f, "\n### 最近の課題")?;
            for issue in eval.recent_issues.iter().take(3) {
                writeln!(f, "- {} (頻度: {}回)", issue.issue, issue.frequency)?;
            }
        }

        Ok(())
    }
}
