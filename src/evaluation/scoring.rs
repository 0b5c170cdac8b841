//! Heuristic scorers driven by a deduction table
//!
//! Every dimension starts at 25 points. Each row of the [`ScoringTable`]
//! belongs to exactly one dimension and subtracts its points every time its
//! [`Check`] fires. The result is floored at zero, so a dimension score always
//! lies in `[0, 25]` and never depends on another dimension's rows.

use crate::evaluation::predicates;
use crate::types::{ArticleMetadata, Dimension, ScoreSet, DIMENSION_MAX};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Condition under which a deduction applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Fires once when the article contains no fenced code block
    NoCodeBlocks,

    /// Fires once per code block that mentions none of `markers`
    /// (case-insensitive)
    CodeBlockMissing { markers: Vec<String> },

    /// Fires once per code block without an inline `marker` comment
    CodeBlockUncommented { marker: String },

    /// Fires when none of `markers` occurs
    MissingAll { markers: Vec<String> },

    /// Fires when fewer than `min` distinct `terms` occur
    FewTerms {
        terms: Vec<String>,
        min: usize,
        #[serde(default)]
        ignore_case: bool,
    },

    /// Fires when `markers` occur fewer than `min` times in total
    FewOccurrences { markers: Vec<String>, min: usize },

    /// Fires when there are fewer than `min` level 1–3 headings
    FewHeadings { min: usize },

    /// Fires when more than `max_count` paragraphs exceed `max_chars`
    LongParagraphs { max_chars: usize, max_count: usize },

    /// Fires when there are fewer than `min` list items
    FewListItems { min: usize },

    /// Fires when the non-whitespace length is below `min_chars`
    ShortText { min_chars: usize },
}

impl Check {
    /// How many times this check fires against `text`
    pub fn firings(&self, text: &str) -> usize {
        match self {
            Check::NoCodeBlocks => usize::from(predicates::code_blocks(text).is_empty()),
            Check::CodeBlockMissing { markers } => predicates::code_blocks(text)
                .into_iter()
                .filter(|code| !predicates::has_error_handling(code, markers))
                .count(),
            Check::CodeBlockUncommented { marker } => predicates::code_blocks(text)
                .into_iter()
                .filter(|code| !predicates::has_inline_comment(code, marker))
                .count(),
            Check::MissingAll { markers } => usize::from(!predicates::contains_any(text, markers)),
            Check::FewTerms {
                terms,
                min,
                ignore_case,
            } => usize::from(predicates::count_terms_present(text, terms, *ignore_case) < *min),
            Check::FewOccurrences { markers, min } => {
                usize::from(predicates::count_occurrences(text, markers) < *min)
            }
            Check::FewHeadings { min } => usize::from(predicates::count_headings(text) < *min),
            Check::LongParagraphs {
                max_chars,
                max_count,
            } => usize::from(predicates::count_long_paragraphs(text, *max_chars) > *max_count),
            Check::FewListItems { min } => {
                usize::from(predicates::count_list_markers(text) < *min)
            }
            Check::ShortText { min_chars } => {
                usize::from(predicates::non_whitespace_chars(text) < *min_chars)
            }
        }
    }
}

/// One row of the scoring table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    /// Stable identifier, used in logs and fired-rule reports
    pub id: String,
    pub dimension: Dimension,
    /// Points removed per firing
    pub points: f64,
    pub check: Check,
}

impl Deduction {
    fn new(id: &str, dimension: Dimension, points: f64, check: Check) -> Self {
        Self {
            id: id.to_string(),
            dimension,
            points,
            check,
        }
    }
}

/// A deduction that fired while scoring an article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredDeduction {
    pub id: String,
    pub dimension: Dimension,
    pub firings: usize,
    pub points: f64,
}

/// Complete set of deductions for all four dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringTable {
    pub deductions: Vec<Deduction>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScoringTable {
    fn default() -> Self {
        use Dimension::*;

        let deductions = vec![
            // Technical accuracy
            Deduction::new("no_code_blocks", TechnicalAccuracy, 10.0, Check::NoCodeBlocks),
            Deduction::new(
                "code_without_error_handling",
                TechnicalAccuracy,
                0.5,
                Check::CodeBlockMissing {
                    markers: strings(&["try:", "except", "error"]),
                },
            ),
            Deduction::new(
                "code_without_comments",
                TechnicalAccuracy,
                0.5,
                Check::CodeBlockUncommented {
                    marker: "#".to_string(),
                },
            ),
            Deduction::new(
                "few_technical_terms",
                TechnicalAccuracy,
                2.0,
                Check::FewTerms {
                    terms: strings(&[
                        "API", "async", "await", "class", "function", "database", "cache",
                    ]),
                    min: 5,
                    ignore_case: true,
                },
            ),
            Deduction::new(
                "not_current",
                TechnicalAccuracy,
                1.0,
                Check::MissingAll {
                    markers: strings(&["2025", "最新"]),
                },
            ),
            // Readability
            Deduction::new("few_sections", Readability, 3.0, Check::FewHeadings { min: 5 }),
            Deduction::new(
                "long_paragraphs",
                Readability,
                2.0,
                Check::LongParagraphs {
                    max_chars: 500,
                    max_count: 3,
                },
            ),
            Deduction::new("few_lists", Readability, 2.0, Check::FewListItems { min: 5 }),
            Deduction::new(
                "no_explanations",
                Readability,
                3.0,
                Check::MissingAll {
                    markers: strings(&["とは", "について", "の概要"]),
                },
            ),
            Deduction::new(
                "no_thought_process",
                Readability,
                5.0,
                Check::MissingAll {
                    markers: strings(&["なぜこの記事を書こうと思ったのか", "AIの思考プロセス"]),
                },
            ),
            // Practicality
            Deduction::new(
                "no_usage_example",
                Practicality,
                5.0,
                Check::MissingAll {
                    markers: strings(&["実装例", "使用例", "サンプルコード"]),
                },
            ),
            Deduction::new(
                "no_step_by_step",
                Practicality,
                3.0,
                Check::MissingAll {
                    markers: strings(&["Step 1", "ステップ1", "手順"]),
                },
            ),
            Deduction::new(
                "no_troubleshooting",
                Practicality,
                2.0,
                Check::MissingAll {
                    markers: strings(&["トラブルシューティング", "よくある問題", "エラー"]),
                },
            ),
            Deduction::new(
                "no_install_instructions",
                Practicality,
                2.0,
                Check::MissingAll {
                    markers: strings(&["pip install", "npm install", "インストール"]),
                },
            ),
            Deduction::new(
                "few_executable_examples",
                Practicality,
                3.0,
                Check::FewTerms {
                    terms: strings(&["if __name__", "async def main", "def main(", "asyncio.run("]),
                    min: 2,
                    ignore_case: false,
                },
            ),
            // Originality
            Deduction::new(
                "no_integration",
                Originality,
                3.0,
                Check::MissingAll {
                    markers: strings(&["との連携", "を組み合わせ", "統合"]),
                },
            ),
            Deduction::new(
                "no_ai_perspective",
                Originality,
                3.0,
                Check::MissingAll {
                    markers: strings(&["AIの視点", "自動化", "機械学習"]),
                },
            ),
            Deduction::new(
                "few_details",
                Originality,
                2.0,
                Check::FewOccurrences {
                    markers: strings(&["詳しく", "詳細に", "深く"]),
                    min: 3,
                },
            ),
            Deduction::new(
                "no_performance",
                Originality,
                2.0,
                Check::MissingAll {
                    markers: strings(&["最適化", "パフォーマンス", "高速化"]),
                },
            ),
            Deduction::new(
                "too_short",
                Originality,
                5.0,
                Check::ShortText { min_chars: 5000 },
            ),
        ];

        Self { deductions }
    }
}

impl ScoringTable {
    /// Rows belonging to `dimension`
    pub fn for_dimension(&self, dimension: Dimension) -> impl Iterator<Item = &Deduction> {
        self.deductions
            .iter()
            .filter(move |d| d.dimension == dimension)
    }

    /// Reject negative or non-finite points and duplicate ids
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for deduction in &self.deductions {
            if !deduction.points.is_finite() || deduction.points < 0.0 {
                return Err(format!(
                    "scoring deduction '{}' must have non-negative finite points",
                    deduction.id
                ));
            }
            if !seen.insert(deduction.id.as_str()) {
                return Err(format!("duplicate scoring deduction id '{}'", deduction.id));
            }
        }
        Ok(())
    }
}

/// Scores one dimension from its rows of the table
pub struct Scorer<'a> {
    dimension: Dimension,
    table: &'a ScoringTable,
}

impl<'a> Scorer<'a> {
    pub fn new(dimension: Dimension, table: &'a ScoringTable) -> Self {
        Self { dimension, table }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Deductions that fired against `text`
    pub fn fired(&self, text: &str) -> Vec<FiredDeduction> {
        self.table
            .for_dimension(self.dimension)
            .filter_map(|d| {
                let firings = d.check.firings(text);
                (firings > 0).then(|| FiredDeduction {
                    id: d.id.clone(),
                    dimension: d.dimension,
                    firings,
                    points: d.points * firings as f64,
                })
            })
            .collect()
    }

    /// Score in `[0, 25]`. Metadata is accepted for interface stability; no
    /// current check reads it.
    pub fn score(&self, text: &str, _metadata: &ArticleMetadata) -> f64 {
        let lost: f64 = self.fired(text).iter().map(|f| f.points).sum();
        let score = (DIMENSION_MAX - lost).max(0.0);
        trace!("{} scored {:.1}", self.dimension, score);
        score
    }
}

/// Score all four dimensions
pub fn score_article(text: &str, metadata: &ArticleMetadata, table: &ScoringTable) -> ScoreSet {
    let mut scores = ScoreSet::default();
    for dimension in Dimension::ALL {
        scores.set(dimension, Scorer::new(dimension, table).score(text, metadata));
    }
    scores
}
